//! Top-level facade tying the parser, container, request handler,
//! resource store, caches, and log together.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::cache::DomainCache;
use crate::config::{EngineConfig, Settings, SubscriptionConfig};
use crate::container::FilterContainer;
use crate::domain::host_of;
use crate::handler::{RequestContext, RequestHandler};
use crate::log::Log;
use crate::resources::ResourceStore;
use crate::subscription::Subscription;
use crate::types::{Decision, ElementType};

pub struct Engine {
    container: RwLock<FilterContainer>,
    handler: RequestHandler,
    log: RwLock<Log>,
    resources: ResourceStore,
    settings: Settings,
    stylesheet_cache: DomainCache,
    script_cache: DomainCache,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Self {
            container: RwLock::new(FilterContainer::new()),
            handler: RequestHandler::new(),
            log: RwLock::new(Log::new()),
            resources: ResourceStore::new(),
            stylesheet_cache: DomainCache::new(settings.domain_cache_capacity),
            script_cache: DomainCache::new(settings.domain_cache_capacity),
            settings,
            subscriptions: RwLock::new(Vec::new()),
        }
    }

    pub fn with_config(settings: Settings, config: &EngineConfig) -> Self {
        let engine = Engine::new(settings);
        *engine.subscriptions.write() = config
            .subscriptions
            .iter()
            .map(|(path, cfg)| Subscription {
                name: path.to_string_lossy().to_string(),
                file_path: path.to_string_lossy().to_string(),
                source_url: cfg.source.clone(),
                enabled: cfg.enabled,
                last_update: cfg.last_update,
                next_update: cfg.next_update,
                filters: Vec::new(),
            })
            .collect();
        engine
    }

    pub fn load_resource_file(&mut self, path: &Path) -> crate::error::Result<()> {
        self.resources.load_file(path)
    }

    pub fn load_resource_dir(&mut self, path: &Path) -> crate::error::Result<()> {
        self.resources.load_dir(path)
    }

    /// Loads (or reloads) a subscription file and adds/replaces it in
    /// the engine's subscription list, then rebuilds the container.
    pub fn load_subscription(&mut self, path: &Path, now: i64) -> crate::error::Result<()> {
        let sub = Subscription::load(path, &self.resources, now)?;
        {
            let mut subs = self.subscriptions.write();
            subs.retain(|s| s.file_path != sub.file_path);
            subs.push(sub);
        }
        self.reload();
        Ok(())
    }

    pub fn set_subscription_enabled(&mut self, file_path: &str, enabled: bool) {
        let mut subs = self.subscriptions.write();
        if let Some(s) = subs.iter_mut().find(|s| s.file_path == file_path) {
            s.enabled = enabled;
        }
        drop(subs);
        self.reload();
    }

    pub fn remove_subscription(&mut self, file_path: &str) {
        self.subscriptions.write().retain(|s| s.file_path != file_path);
        self.reload();
    }

    /// Rebuilds the container and clears both per-domain caches.
    pub fn reload(&mut self) {
        let subs = self.subscriptions.read();
        let rebuilt = FilterContainer::build(&subs);
        drop(subs);
        *self.container.write() = rebuilt;
        self.stylesheet_cache.clear();
        self.script_cache.clear();
    }

    pub fn load_started(&self) {
        self.handler.load_started();
    }

    pub fn num_ads_blocked_on_page(&self) -> u64 {
        self.handler.num_ads_blocked_on_page()
    }

    pub fn total_requests_blocked(&self) -> u64 {
        self.handler.total_requests_blocked()
    }

    pub fn should_block(&self, first_party_url: &str, request_url: &str, type_mask: ElementType, now: i64) -> Decision {
        let ctx = RequestContext::new(first_party_url, request_url, type_mask);
        let mut container = self.container.write();
        let mut log = self.log.write();
        self.handler.should_block(&mut container, &mut log, &ctx, now)
    }

    pub fn prune_log(&self, now: i64) {
        self.log.write().prune(now);
    }

    pub fn log_entries_for(&self, first_party_url: &str) -> Vec<crate::log::LogEntry> {
        self.log.read().entries_for(first_party_url).to_vec()
    }

    /// Empty string if a `generic_hide` exception matches the page;
    /// otherwise the pre-built global stylesheet.
    pub fn generic_stylesheet(&self, page_url: &str) -> String {
        let host = host_of(page_url);
        let container = self.container.read();
        if container.has_generic_hide_filter(&host, page_url, &host) {
            String::new()
        } else {
            container.global_stylesheet.clone()
        }
    }

    pub fn domain_stylesheet(&self, page_url: &str) -> String {
        let host = host_of(page_url);
        if let Some(cached) = self.stylesheet_cache.get(&host) {
            return cached;
        }
        let container = self.container.read();
        let mut css = String::new();
        let mut pending = String::new();
        let mut count = 0usize;
        for f in container.domain_based_hiding_filters(&host) {
            pending.push_str(&f.eval_string);
            pending.push(',');
            count += 1;
            if count >= 1000 {
                pending.push_str("{ display: none !important; } ");
                css.push_str(&pending);
                pending.clear();
                count = 0;
            }
        }
        if count > 0 {
            pending.push_str("{ display: none !important; } ");
            css.push_str(&pending);
        }
        for f in container.domain_based_custom_hiding_filters(&host) {
            css.push_str(&f.eval_string);
        }
        self.stylesheet_cache.put(host, css.clone());
        css
    }

    pub fn domain_javascript(&self, page_url: &str) -> String {
        let host = host_of(page_url);
        if let Some(cached) = self.script_cache.get(&host) {
            return cached;
        }
        let mut container = self.container.write();
        let mut javascript = String::new();
        for f in container.domain_based_script_injection_filters(&host) {
            javascript.push_str(&f.eval_string);
        }

        let mut csp_directives: Vec<String> = Vec::new();
        if container
            .find_inline_script_blocking_filter(&host, page_url, &host)
            .is_some()
        {
            csp_directives.push("script-src 'unsafe-eval' * blob: data:".to_string());
        }
        for f in container.matching_csp_filters(&host, page_url, &host) {
            if let Some(csp) = &f.content_security_policy {
                csp_directives.push(csp.clone());
            }
        }
        drop(container);

        if !csp_directives.is_empty() {
            let joined = csp_directives.join("; ").replace('"', "\\\"");
            javascript.push_str(&csp_injection_script(&joined));
        }

        self.script_cache.put(host, javascript.clone());
        javascript
    }

    pub fn config_snapshot(&self) -> EngineConfig {
        let subs = self.subscriptions.read();
        let mut config = EngineConfig {
            requests_blocked: self.handler.total_requests_blocked(),
            subscriptions: Default::default(),
        };
        for s in subs.iter() {
            config.subscriptions.insert(
                PathBuf::from(&s.file_path),
                SubscriptionConfig {
                    enabled: s.enabled,
                    last_update: s.last_update,
                    next_update: s.next_update,
                    source: s.source_url.clone(),
                },
            );
        }
        config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

fn csp_injection_script(directives: &str) -> String {
    format!(
        "(function() {{\n  function inject() {{\n    var meta = document.createElement('meta');\n    meta.httpEquiv = 'Content-Security-Policy';\n    meta.content = \"{directives}\";\n    document.head && document.head.appendChild(meta);\n  }}\n  if (document.readyState === 'loading') {{\n    document.onreadystatechange = inject;\n  }} else {{\n    inject();\n  }}\n}})();\n"
    )
}
