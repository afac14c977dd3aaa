//! Built-in record catalog
//!
//! Binds every built-in kind at startup and maps the `kind` tag of an input
//! line to its concrete record type.

use serde::de::DeserializeOwned;
use tracing::debug;

use contracts::records::{AlarmRuleConfig, ProfileTaskRecord, UiTemplate};
use contracts::{ModuleContext, NoneStream, ScopeId};
use dispatcher::{DispatcherError, NoneStreamDispatcher, Registration};
use observability::metrics as obs;

use crate::error::{CliError, Result};

/// Catalog entry for display
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub kind: &'static str,
    pub stream: &'static str,
    pub scope_id: ScopeId,
}

/// Built-in record kinds, in registration order
pub const BUILTIN_STREAMS: [CatalogEntry; 3] = [
    CatalogEntry {
        kind: UiTemplate::KIND,
        stream: UiTemplate::STREAM,
        scope_id: ScopeId::UI_TEMPLATE,
    },
    CatalogEntry {
        kind: AlarmRuleConfig::KIND,
        stream: AlarmRuleConfig::STREAM,
        scope_id: ScopeId::ALARM_RULE,
    },
    CatalogEntry {
        kind: ProfileTaskRecord::KIND,
        stream: ProfileTaskRecord::STREAM,
        scope_id: ScopeId::PROFILE_TASK,
    },
];

/// Register every built-in kind; the first failure aborts startup.
pub(super) fn register_builtins(
    dispatcher: &mut NoneStreamDispatcher,
    ctx: &ModuleContext,
) -> std::result::Result<Vec<(&'static str, Registration)>, DispatcherError> {
    Ok(vec![
        (
            UiTemplate::KIND,
            dispatcher.register(UiTemplate::definition(), ctx)?,
        ),
        (
            AlarmRuleConfig::KIND,
            dispatcher.register(AlarmRuleConfig::definition(), ctx)?,
        ),
        (
            ProfileTaskRecord::KIND,
            dispatcher.register(ProfileTaskRecord::definition(), ctx)?,
        ),
    ])
}

/// Decode `record` as the type tagged by `kind` and dispatch it.
///
/// Returns whether a worker took the record. Kinds outside the catalog
/// are treated like unbound kinds.
pub(super) fn route(
    dispatcher: &NoneStreamDispatcher,
    kind: &str,
    record: serde_json::Value,
) -> Result<bool> {
    if kind == UiTemplate::KIND {
        dispatch_as::<UiTemplate>(dispatcher, record)
    } else if kind == AlarmRuleConfig::KIND {
        dispatch_as::<AlarmRuleConfig>(dispatcher, record)
    } else if kind == ProfileTaskRecord::KIND {
        dispatch_as::<ProfileTaskRecord>(dispatcher, record)
    } else {
        debug!(kind, "Unknown record kind, ignored");
        obs::record_unrouted(kind);
        Ok(false)
    }
}

fn dispatch_as<R>(dispatcher: &NoneStreamDispatcher, record: serde_json::Value) -> Result<bool>
where
    R: NoneStream + DeserializeOwned,
{
    let record: R =
        serde_json::from_value(record).map_err(|e| CliError::record_parse(R::KIND, e.to_string()))?;
    Ok(dispatcher.dispatch(record))
}
