//! minijinja integration
//!
//! Registers `server_tag(remote_url, cache_interval=300, render_script=none)`
//! as a global template function. The function returns a safe string, so an
//! auto-escaping template inserts the tags verbatim:
//!
//! ```jinja
//! <head>
//!   {{ server_tag("https://cdn.example.com/manifest.json", 60) }}
//! </head>
//! ```
//!
//! The optional parameters may also be given by keyword, e.g.
//! `server_tag(url, render_script=preload)`.
//!
//! `render_script` may be any callable template value, such as a macro. It
//! receives the manifest as a map with a `js` list.

use std::sync::Arc;

use minijinja::value::{from_args, Kwargs, Object};
use minijinja::{Environment, Error, ErrorKind, State, Value};

use crate::renderer::{ScriptManifestRenderer, DEFAULT_CACHE_INTERVAL};

/// Name under which the tag is registered
pub const TAG_NAME: &str = "server_tag";

/// Adds the `server_tag` function to `env`
pub fn register(env: &mut Environment<'_>, renderer: Arc<ScriptManifestRenderer>) {
    env.add_global(TAG_NAME, Value::from_object(ServerTag { renderer }));
}

/// Callable template value wrapping a shared renderer
#[derive(Debug)]
struct ServerTag {
    renderer: Arc<ScriptManifestRenderer>,
}

impl Object for ServerTag {
    fn call(self: &Arc<Self>, state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        let (remote_url, cache_interval, render_script, kwargs): (
            String,
            Option<u64>,
            Option<Value>,
            Kwargs,
        ) = from_args(args)?;
        let cache_interval = positional_or_keyword(cache_interval, &kwargs, "cache_interval")?
            .unwrap_or(DEFAULT_CACHE_INTERVAL);
        let render_script = positional_or_keyword(render_script, &kwargs, "render_script")?;
        kwargs.assert_all_used()?;

        match render_script.filter(|script| !script.is_none() && !script.is_undefined()) {
            Some(script) => {
                let manifest = self
                    .renderer
                    .load_manifest(&remote_url, cache_interval)
                    .into_manifest();
                let rendered = script.call(state, &[Value::from_serialize(&manifest)])?;
                Ok(Value::from_safe_string(rendered.to_string()))
            }
            None => Ok(self.renderer.render(&remote_url, cache_interval, None).into()),
        }
    }
}

/// Takes a parameter from its position or its keyword, but not both
fn positional_or_keyword<'a, T>(
    positional: Option<T>,
    kwargs: &'a Kwargs,
    name: &'a str,
) -> Result<Option<T>, Error>
where
    T: minijinja::value::ArgType<'a, Output = T>,
{
    let keyword: Option<T> = kwargs.get(name)?;
    match (positional, keyword) {
        (Some(_), Some(_)) => Err(Error::new(
            ErrorKind::TooManyArguments,
            format!("{TAG_NAME}() got multiple values for argument '{name}'"),
        )),
        (positional, keyword) => Ok(positional.or(keyword)),
    }
}
