//! Options for global handlers and the hub.
//!
//! Both option types can be read from the environment:
//!
//! - `UNHANDLED_HANDLERS` selects the hooks [`GlobalHandlers::setup_once`]
//!   installs. It is a comma-separated list of `onerror`,
//!   `onunhandledrejection` and `none`.
//! - `UNHANDLED_MAX_VALUE_LENGTH` sets [`ClientOptions::max_value_length`].
//!
//! The environment is read once per process. Values that cannot be parsed
//! are logged and ignored.
//!
//! [`GlobalHandlers::setup_once`]: crate::hooks::GlobalHandlers::setup_once

use std::sync::OnceLock;

use crate::ConfigError;

/// Selects which global hooks are installed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobalHandlersOptions {
    /// Install the synchronous failure hook.
    pub onerror: bool,
    /// Install the unhandled-rejection hook.
    pub onunhandledrejection: bool,
}

impl GlobalHandlersOptions {
    /// Both hooks enabled.
    pub const DEFAULT: Self = Self {
        onerror: true,
        onunhandledrejection: true,
    };

    /// The default options, overridden by `UNHANDLED_HANDLERS` if set.
    pub fn new_from_env() -> Self {
        EnvOptions::get().handlers.unwrap_or(Self::DEFAULT)
    }

    /// Parses a comma-separated handler list.
    ///
    /// Names are matched case-insensitively and `none` selects nothing on its
    /// own. Empty entries are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownHandler`] for any other name.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let mut options = Self {
            onerror: false,
            onunhandledrejection: false,
        };
        for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            if name.eq_ignore_ascii_case("onerror") {
                options.onerror = true;
            } else if name.eq_ignore_ascii_case("onunhandledrejection") {
                options.onunhandledrejection = true;
            } else if !name.eq_ignore_ascii_case("none") {
                return Err(ConfigError::UnknownHandler(name.to_owned()));
            }
        }
        Ok(options)
    }
}

impl Default for GlobalHandlersOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Options of the [`Hub`](crate::hub::Hub).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClientOptions {
    /// Maximum length of fallback exception values. `None` uses
    /// [`DEFAULT_MAX_VALUE_LENGTH`](crate::event::DEFAULT_MAX_VALUE_LENGTH).
    pub max_value_length: Option<usize>,
}

impl ClientOptions {
    /// No maximum value length configured.
    pub const DEFAULT: Self = Self {
        max_value_length: None,
    };

    /// The default options, overridden by `UNHANDLED_MAX_VALUE_LENGTH` if set.
    pub fn new_from_env() -> Self {
        Self {
            max_value_length: EnvOptions::get().max_value_length,
        }
    }

    /// Sets the maximum length of fallback exception values.
    pub fn max_value_length(mut self, max_value_length: usize) -> Self {
        self.max_value_length = Some(max_value_length);
        self
    }
}

#[derive(Debug, Default, PartialEq)]
struct EnvOptions {
    handlers: Option<GlobalHandlersOptions>,
    max_value_length: Option<usize>,
}

impl EnvOptions {
    fn get() -> &'static Self {
        static UNHANDLED_FLAGS: OnceLock<EnvOptions> = OnceLock::new();

        UNHANDLED_FLAGS.get_or_init(|| {
            let handlers = std::env::var_os("UNHANDLED_HANDLERS");
            let max_value_length = std::env::var_os("UNHANDLED_MAX_VALUE_LENGTH");
            Self::from_vars(
                handlers.as_deref().map(|var| var.to_string_lossy()).as_deref(),
                max_value_length
                    .as_deref()
                    .map(|var| var.to_string_lossy())
                    .as_deref(),
            )
        })
    }

    fn from_vars(handlers: Option<&str>, max_value_length: Option<&str>) -> Self {
        let handlers = handlers.and_then(|list| {
            GlobalHandlersOptions::parse(list)
                .inspect_err(|error| tracing::warn!(%error, "ignoring UNHANDLED_HANDLERS"))
                .ok()
        });
        let max_value_length = max_value_length.and_then(|value| {
            parse_max_value_length(value)
                .inspect_err(|error| tracing::warn!(%error, "ignoring UNHANDLED_MAX_VALUE_LENGTH"))
                .ok()
        });
        Self {
            handlers,
            max_value_length,
        }
    }
}

fn parse_max_value_length(value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidMaxValueLength {
            value: value.to_owned(),
            source,
        })
}
