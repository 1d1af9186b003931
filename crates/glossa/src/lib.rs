//! Glossa - a localization resolution engine.
//!
//! Resources are fetched through an injected transport, parsed into
//! per-language entity tables ([`glossa_syntax`]), cached process-wide by the
//! [`Environment`], and resolved by per-view [`Context`]s against a
//! negotiated language fallback chain ([`glossa_locale`]).
//!
//! ```no_run
//! use glossa::{Environment, Error, Key, Language};
//!
//! async fn example() {
//!     let env = Environment::new("en-US", |res_id: &str, _lang: &Language| {
//!         let url = format!("/locales/{res_id}");
//!         async move {
//!             let _ = url;
//!             Err::<String, Error>(Error::Fetch {
//!                 resource: "app.properties".into(),
//!                 message: "transport goes here".into(),
//!             })
//!         }
//!     });
//!
//!     let ctx = env.create_context(["app.properties"]);
//!     let langs = [Language::app("en-US")];
//!     let values = ctx.resolve_values(&langs, &[Key::new("greet")]).await;
//!     assert_eq!(values.len(), 1);
//! }
//! ```

pub mod context;
pub mod env;
pub mod events;
mod resolver;

pub use context::{Context, Key, ResolvedEntity};
pub use env::{Environment, Fetch, FetchFuture, Grammar};
pub use events::{Event, ListenerHandle};
pub use resolver::{ArgValue, Args};

pub use glossa_locale as locale;
pub use glossa_syntax as syntax;
pub use glossa_tree as tree;

pub use glossa_locale::{negotiate_languages, Language, LanguageChain};
pub use glossa_tree::{Error, EventKind};
