//! Per-view resolution scope.
//!
//! A context owns a set of resource ids and resolves batches of keys
//! against a language fallback chain. It holds no parsed data itself; every
//! lookup goes through the environment's shared cache. Results are always
//! positionally aligned with the input keys, and no content-related error
//! escapes a batch call; missing entities degrade to an identifier echo.

use std::rc::Rc;

use compact_str::CompactString;
use futures::future::join_all;
use rustc_hash::FxHashMap;

use glossa_locale::Language;
use glossa_tree::{Entity, Entry, Error, EventKind};

use crate::env::{CacheKey, EnvInner};
use crate::resolver::{
    format_attr, format_entry, Args, EntryLookup, EntryRef, NumberFormatters, ResolutionChain,
    ResolveCtx,
};

/// One batch-resolve key: an entity id plus optional arguments.
#[derive(Debug, Clone, Default)]
pub struct Key {
    pub id: CompactString,
    pub args: Option<Args>,
}

impl Key {
    pub fn new(id: impl Into<CompactString>) -> Self {
        Key {
            id: id.into(),
            args: None,
        }
    }

    pub fn with_args(id: impl Into<CompactString>, args: Args) -> Self {
        Key {
            id: id.into(),
            args: Some(args),
        }
    }
}

impl From<&str> for Key {
    fn from(id: &str) -> Self {
        Key::new(id)
    }
}

/// A fully formatted entity: its value plus every formatted attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub value: String,
    pub attrs: Option<FxHashMap<CompactString, String>>,
}

/// The resolution scope bound to one view.
pub struct Context {
    id: u64,
    env: Rc<EnvInner>,
    res_ids: Rc<Vec<CompactString>>,
    formatters: NumberFormatters,
}

impl Context {
    pub(crate) fn new(id: u64, env: Rc<EnvInner>, res_ids: Rc<Vec<CompactString>>) -> Self {
        Context {
            id,
            env,
            res_ids,
            formatters: NumberFormatters::default(),
        }
    }

    pub(crate) fn ctx_id(&self) -> u64 {
        self.id
    }

    /// The resource ids this context resolves against, in registration order.
    pub fn resource_ids(&self) -> &[CompactString] {
        &self.res_ids
    }

    /// Prefetch this context's resources for the first language of the chain.
    pub async fn fetch(&self, langs: &[Language]) {
        if let Some(lang) = langs.first() {
            self.fetch_lang(lang).await;
        }
    }

    /// Resolve a batch of keys to plain string values.
    pub async fn resolve_values(&self, langs: &[Language], keys: &[Key]) -> Vec<String> {
        self.resolve(
            langs,
            keys,
            |ctx, lang, key, entry_ref| ctx.format_value(lang, key, entry_ref),
            |id| id.to_string(),
        )
        .await
    }

    /// Resolve a batch of keys to values plus formatted attributes.
    pub async fn resolve_entities(&self, langs: &[Language], keys: &[Key]) -> Vec<ResolvedEntity> {
        self.resolve(
            langs,
            keys,
            |ctx, lang, key, entry_ref| ctx.format_entity(lang, key, entry_ref),
            |id| ResolvedEntity {
                value: id.to_string(),
                attrs: None,
            },
        )
        .await
    }

    /// Walk the fallback chain: parse lazily, format what matches, carry
    /// misses into the next language. Output order always matches `keys`.
    async fn resolve<T>(
        &self,
        langs: &[Language],
        keys: &[Key],
        format: impl Fn(&Self, &Language, &Key, &EntryRef) -> T,
        missing: impl Fn(&str) -> T,
    ) -> Vec<T> {
        let mut results: Vec<Option<T>> = keys.iter().map(|_| None).collect();

        for lang in langs {
            if results.iter().all(Option::is_some) {
                break;
            }
            self.fetch_lang(lang).await;

            for (slot, key) in results.iter_mut().zip(keys) {
                if slot.is_some() {
                    continue;
                }
                match self.get_entry(lang, &key.id) {
                    Some(entry_ref) => *slot = Some(format(self, lang, key, &entry_ref)),
                    None => self.env.emit(
                        EventKind::NotFoundError,
                        Some(lang),
                        &Error::NotFound {
                            ids: vec![key.id.clone()],
                            lang: Some(lang.code.clone()),
                        },
                    ),
                }
            }
        }

        if results.iter().any(Option::is_none) {
            let mut missing_ids: Vec<CompactString> = Vec::new();
            for (slot, key) in results.iter().zip(keys) {
                if slot.is_none() && !missing_ids.contains(&key.id) {
                    missing_ids.push(key.id.clone());
                }
            }
            self.env.emit(
                EventKind::NotFoundError,
                None,
                &Error::NotFound {
                    ids: missing_ids,
                    lang: None,
                },
            );
            for (slot, key) in results.iter_mut().zip(keys) {
                if slot.is_none() {
                    *slot = Some(missing(&key.id));
                }
            }
        }

        results.into_iter().flatten().collect()
    }

    /// Ensure every resource of this context is fetched and parsed for the
    /// language. Completed cache slots resolve immediately.
    async fn fetch_lang(&self, lang: &Language) {
        let slots: Vec<_> = self
            .res_ids
            .iter()
            .map(|res| self.env.resource(lang, res))
            .collect();
        // Fetch errors are already cached and reported; resolution simply
        // skips those resources.
        let _ = join_all(slots).await;
    }

    /// First resource containing the id wins; cached errors are skipped.
    fn get_entry(&self, lang: &Language, id: &str) -> Option<EntryRef> {
        for res in self.res_ids.iter() {
            let key = CacheKey {
                res: res.clone(),
                code: lang.code.clone(),
                src: lang.src,
            };
            let slot = self.env.cache.borrow().get(&key).cloned();
            let Some(slot) = slot else {
                continue;
            };
            let Some(Ok(map)) = slot.peek() else {
                continue;
            };
            if map.contains_key(id) {
                return Some(EntryRef::new(Rc::clone(map), id));
            }
        }
        None
    }

    fn format_value(&self, lang: &Language, key: &Key, entry_ref: &EntryRef) -> String {
        self.run_format(lang, key.args.as_ref(), &key.id, |rcx, chain| {
            format_entry(rcx, entry_ref.entry(), chain)
        })
    }

    fn format_entity(&self, lang: &Language, key: &Key, entry_ref: &EntryRef) -> ResolvedEntity {
        let value = self.format_value(lang, key, entry_ref);

        let attrs = match entry_ref.entry() {
            Entry::Entity(Entity {
                attrs: Some(attrs), ..
            }) => {
                let mut formatted = FxHashMap::default();
                for (name, attr) in attrs {
                    let echo = format!("{}::{name}", key.id);
                    let attr_value = self.run_format(lang, key.args.as_ref(), &echo, |rcx, chain| {
                        format_attr(rcx, attr, chain)
                    });
                    formatted.insert(name.clone(), attr_value);
                }
                Some(formatted)
            }
            _ => None,
        };

        ResolvedEntity { value, attrs }
    }

    /// Run one format call with a fresh in-progress set. Recovered placeable
    /// errors are reported; a failing entity degrades to its id.
    fn run_format(
        &self,
        lang: &Language,
        args: Option<&Args>,
        id_echo: &str,
        format: impl FnOnce(&ResolveCtx<'_>, &mut ResolutionChain) -> Result<String, Error>,
    ) -> String {
        let mut chain = ResolutionChain::default();
        let rcx = ResolveCtx {
            lang,
            args,
            source: self,
            formatters: &self.formatters,
        };

        let result = format(&rcx, &mut chain);
        for error in chain.errors.drain(..) {
            self.env.emit(EventKind::ResolveError, Some(lang), &error);
        }

        match result {
            Ok(value) => value,
            Err(error) => {
                self.env.emit(EventKind::ResolveError, Some(lang), &error);
                id_echo.to_string()
            }
        }
    }
}

impl EntryLookup for Context {
    fn lookup(&self, lang: &Language, id: &str) -> Option<EntryRef> {
        self.get_entry(lang, id)
    }
}
