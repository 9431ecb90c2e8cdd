//! Named lifecycle phases that hooks attach to.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A lifecycle phase.
///
/// Each phase has a stable wire name (`configHooks`, `initHooks`, ...) that
/// extension manifests use to declare their hooks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Runs per target before expression resolution.
    Config,
    /// Runs once after a project has been scaffolded.
    Init,
    /// Runs before a build.
    Build,
    /// Runs before the development server starts.
    Serve,
    /// Runs before a deployment.
    Deploy,
    /// Any other phase declared by an extension.
    Custom(String),
}

impl HookPhase {
    /// Returns the wire name of this phase.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Config => "configHooks",
            Self::Init => "initHooks",
            Self::Build => "buildHooks",
            Self::Serve => "serveHooks",
            Self::Deploy => "deployHooks",
            Self::Custom(name) => name,
        }
    }

    /// Returns the built-in phases.
    pub const fn known() -> [Self; 5] {
        [
            Self::Config,
            Self::Init,
            Self::Build,
            Self::Serve,
            Self::Deploy,
        ]
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookPhase {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "configHooks" => Self::Config,
            "initHooks" => Self::Init,
            "buildHooks" => Self::Build,
            "serveHooks" => Self::Serve,
            "deployHooks" => Self::Deploy,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl From<&str> for HookPhase {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(phase) => phase,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for phase in HookPhase::known() {
            assert_eq!(HookPhase::from(phase.as_str()), phase);
        }
    }

    #[test]
    fn test_custom_phase() {
        let phase = HookPhase::from("compileHooks");
        assert_eq!(phase, HookPhase::Custom("compileHooks".into()));
        assert_eq!(phase.to_string(), "compileHooks");
    }
}
