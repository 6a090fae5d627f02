use crate::contract::{LoadedComponent, Lookup};
use crate::errors::{ExportError, ExportProblem};
use std::fmt;

pub const INITIALIZER_EXPORT: &str = "nexus_init";
pub const PLUGIN_EXPORT: &str = "SmartContextPlugin";

/// The two entry points the bridge needs from a component
pub struct Capabilities<I, F> {
    pub initializer: I,
    pub plugin_type: F,
}

/// Backend handles are opaque, so only the shape is printed.
impl<I, F> fmt::Debug for Capabilities<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}

/// Look up `nexus_init` and `SmartContextPlugin` by exact name.
///
/// Both names are checked before failing so the error names every problem.
/// Nothing is invoked here.
pub fn resolve_capabilities<C: LoadedComponent>(
    component: &C,
) -> Result<Capabilities<C::Initializer, C::Factory>, ExportError> {
    let mut problems = Vec::new();

    let initializer = match component.initializer(INITIALIZER_EXPORT) {
        Lookup::Found(init) => Some(init),
        Lookup::Missing => {
            problems.push(ExportProblem::Missing(INITIALIZER_EXPORT.to_string()));
            None
        }
        Lookup::WrongKind => {
            problems.push(ExportProblem::WrongKind {
                name: INITIALIZER_EXPORT.to_string(),
                expected: "callable",
            });
            None
        }
    };

    let plugin_type = match component.plugin_type(PLUGIN_EXPORT) {
        Lookup::Found(factory) => Some(factory),
        Lookup::Missing => {
            problems.push(ExportProblem::Missing(PLUGIN_EXPORT.to_string()));
            None
        }
        Lookup::WrongKind => {
            problems.push(ExportProblem::WrongKind {
                name: PLUGIN_EXPORT.to_string(),
                expected: "a class",
            });
            None
        }
    };

    match (initializer, plugin_type) {
        (Some(initializer), Some(plugin_type)) => Ok(Capabilities {
            initializer,
            plugin_type,
        }),
        _ => Err(ExportError {
            namespace: component.namespace().to_string(),
            problems,
        }),
    }
}
