//! The shared resource environment.
//!
//! One `Environment` is constructed per process (or per embedding) and
//! passed by reference to every context. It owns the parsed-resource cache:
//! the cache slot for a `(resource, language)` pair is the shared in-flight
//! fetch/parse future itself, inserted before first poll, so concurrent
//! identical requests coalesce on one fetch and a completed slot resolves
//! immediately. Fetch failures stay cached as negative results.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use compact_str::CompactString;
use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;
use rustc_hash::FxHashMap;

use glossa_locale::{pseudo_locale, LangSource, Language};
use glossa_syntax::{parse_json, parse_l20n, parse_properties};
use glossa_tree::{walk_entry, EntryMap, Error, EventKind};

use crate::context::Context;
use crate::events::{Event, ListenerHandle, Listeners};

/// Future returned by the injected fetch operation.
pub type FetchFuture = LocalBoxFuture<'static, Result<String, Error>>;

/// The injected resource transport. The engine performs no I/O itself; the
/// embedder curries in whatever it needs (app version, base URL) before
/// handing the operation over.
pub trait Fetch {
    fn fetch(&self, res_id: &str, lang: &Language) -> FetchFuture;
}

impl<F, Fut> Fetch for F
where
    F: Fn(&str, &Language) -> Fut,
    Fut: Future<Output = Result<String, Error>> + 'static,
{
    fn fetch(&self, res_id: &str, lang: &Language) -> FetchFuture {
        Box::pin(self(res_id, lang))
    }
}

/// Resource grammars, selected by filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    L20n,
    Properties,
    Json,
}

pub(crate) type ResourceResult = Result<Rc<EntryMap>, Error>;
pub(crate) type ResourceSlot = Shared<LocalBoxFuture<'static, ResourceResult>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    pub res: CompactString,
    pub code: CompactString,
    pub src: LangSource,
}

/// Process-wide cache of parsed entity tables, shared by all contexts.
pub struct Environment {
    inner: Rc<EnvInner>,
}

pub(crate) struct EnvInner {
    pub(crate) default_lang: CompactString,
    fetch: Box<dyn Fetch>,
    grammars: RefCell<FxHashMap<CompactString, Grammar>>,
    pub(crate) cache: RefCell<FxHashMap<CacheKey, ResourceSlot>>,
    contexts: RefCell<FxHashMap<u64, Rc<Vec<CompactString>>>>,
    next_ctx: Cell<u64>,
    listeners: Listeners,
}

impl Environment {
    /// Create an environment around the default language and a transport.
    pub fn new(default_lang: impl Into<CompactString>, fetch: impl Fetch + 'static) -> Self {
        let mut grammars = FxHashMap::default();
        grammars.insert(CompactString::const_new("l20n"), Grammar::L20n);
        grammars.insert(CompactString::const_new("properties"), Grammar::Properties);
        grammars.insert(CompactString::const_new("json"), Grammar::Json);

        Environment {
            inner: Rc::new(EnvInner {
                default_lang: default_lang.into(),
                fetch: Box::new(fetch),
                grammars: RefCell::new(grammars),
                cache: RefCell::new(FxHashMap::default()),
                contexts: RefCell::new(FxHashMap::default()),
                next_ctx: Cell::new(0),
                listeners: Listeners::default(),
            }),
        }
    }

    pub fn default_lang(&self) -> &str {
        &self.inner.default_lang
    }

    /// Map a resource filename extension to a grammar.
    pub fn set_grammar(&self, ext: impl Into<CompactString>, grammar: Grammar) {
        self.inner.grammars.borrow_mut().insert(ext.into(), grammar);
    }

    /// Register a view's resolution scope.
    pub fn create_context<I, S>(&self, res_ids: I) -> Context
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        let mut list: Vec<CompactString> = Vec::new();
        for res_id in res_ids {
            let res_id = res_id.into();
            if !list.contains(&res_id) {
                list.push(res_id);
            }
        }
        let list = Rc::new(list);

        let id = self.inner.next_ctx.get();
        self.inner.next_ctx.set(id + 1);
        self.inner.contexts.borrow_mut().insert(id, Rc::clone(&list));

        Context::new(id, Rc::clone(&self.inner), list)
    }

    /// Unregister a context and evict every cached entry of any resource no
    /// longer referenced by a live context.
    pub fn destroy_context(&self, ctx: &Context) {
        let removed = self.inner.contexts.borrow_mut().remove(&ctx.ctx_id());
        let Some(removed) = removed else {
            return;
        };

        let contexts = self.inner.contexts.borrow();
        let mut cache = self.inner.cache.borrow_mut();
        for res in removed.iter() {
            let needed = contexts.values().any(|list| list.contains(res));
            if !needed {
                tracing::debug!(res = %res, "evicting orphaned resource");
                cache.retain(|key, _| key.res != *res);
            }
        }
    }

    /// Subscribe to the error/event channel. `None` receives every kind.
    pub fn add_listener(
        &self,
        filter: Option<EventKind>,
        callback: impl Fn(&Event) + 'static,
    ) -> ListenerHandle {
        self.inner.listeners.add(filter, Rc::new(callback))
    }

    pub fn remove_listener(&self, handle: ListenerHandle) {
        self.inner.listeners.remove(handle);
    }
}

impl EnvInner {
    pub(crate) fn emit(&self, kind: EventKind, lang: Option<&Language>, error: &Error) {
        tracing::debug!(kind = kind.as_str(), %error, "l10n event");
        self.listeners.emit(&Event {
            kind,
            lang: lang.cloned(),
            error: error.clone(),
        });
    }

    /// Return the cache slot for `(res_id, lang)`, starting the fetch/parse
    /// if this is the first request.
    pub(crate) fn resource(self: &Rc<Self>, lang: &Language, res_id: &str) -> ResourceSlot {
        let key = CacheKey {
            res: res_id.into(),
            code: lang.code.clone(),
            src: lang.src,
        };

        if let Some(slot) = self.cache.borrow().get(&key) {
            return slot.clone();
        }

        tracing::debug!(res = res_id, lang = %lang.code, "fetching resource");
        let env = Rc::clone(self);
        let lang = lang.clone();
        let res: CompactString = res_id.into();
        let fut: LocalBoxFuture<'static, ResourceResult> =
            Box::pin(async move { env.fetch_and_parse(&lang, &res).await });
        let slot = fut.shared();

        self.cache.borrow_mut().insert(key, slot.clone());
        slot
    }

    async fn fetch_and_parse(&self, lang: &Language, res_id: &str) -> ResourceResult {
        // Pseudo-languages reuse the default language's fetched text and
        // synthesize their own entries.
        let fetch_lang = if lang.src == LangSource::Pseudo {
            Language::app(self.default_lang.clone())
        } else {
            lang.clone()
        };

        let text = match self.fetch.fetch(res_id, &fetch_lang).await {
            Ok(text) => text,
            Err(error) => {
                self.emit(EventKind::FetchError, Some(lang), &error);
                return Err(error);
            }
        };

        let entries = self.parse(lang, res_id, &text)?;

        let entries = if lang.src == LangSource::Pseudo {
            match pseudo_locale(&lang.code) {
                Some(pseudo) => entries
                    .iter()
                    .map(|(id, entry)| {
                        (id.clone(), walk_entry(entry, &|s| pseudo.process(s).into()))
                    })
                    .collect(),
                None => {
                    let error = Error::Fetch {
                        resource: res_id.into(),
                        message: format!("unknown pseudo-locale \"{}\"", lang.code),
                    };
                    self.emit(EventKind::FetchError, Some(lang), &error);
                    return Err(error);
                }
            }
        } else {
            entries
        };

        Ok(Rc::new(entries))
    }

    fn parse(&self, lang: &Language, res_id: &str, text: &str) -> Result<EntryMap, Error> {
        let ext = res_id.rsplit('.').next().unwrap_or_default();
        let grammar = self.grammars.borrow().get(ext).copied();
        let Some(grammar) = grammar else {
            let error = Error::UnknownFormat { ext: ext.into() };
            self.emit(EventKind::FetchError, Some(lang), &error);
            return Err(error);
        };

        let mut emit = |kind: EventKind, error: Error| self.emit(kind, Some(lang), &error);
        match grammar {
            Grammar::L20n => parse_l20n(text, Some(&mut emit)),
            Grammar::Properties => parse_properties(text, Some(&mut emit)),
            Grammar::Json => parse_json(text, Some(&mut emit)),
        }
    }
}
