use std::path::Path;

use tracing::debug;

use super::{OptionDefinition, OptionsRegistry, ParsedOptions, Value, ValueKind, ValueOrigin};
use crate::error::{OptionsError, Result};

/// Fill options that are still unset from the TOML file at `path`
pub(super) fn apply(
    registry: &OptionsRegistry,
    parsed: &mut ParsedOptions,
    path: &Path,
) -> Result<()> {
    let contents = std::fs::read_to_string(path).map_err(|e| OptionsError::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let table: toml::Table = toml::from_str(&contents).map_err(|e| OptionsError::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    for (key, raw) in &table {
        let definition = registry
            .definition(key)
            .ok_or_else(|| OptionsError::UnknownOption(key.clone()))?;
        let value = from_toml(definition, raw).ok_or_else(|| OptionsError::MalformedValue {
            option: key.clone(),
            value: raw.to_string(),
            reason: format!("expected {} in '{}'", definition.kind(), path.display()),
        })?;

        debug!(option = %key, %value, file = %path.display(), "option read from config file");
        parsed.fill(key, value, ValueOrigin::ConfigFile);
    }

    Ok(())
}

pub(super) fn write_template(registry: &OptionsRegistry, path: &Path) -> Result<()> {
    let table = registry
        .definitions()
        .iter()
        .filter_map(|d| {
            let value = to_toml(d.default_value()?)?;
            Some((d.name().to_string(), value))
        })
        .collect::<toml::Table>();

    let contents = toml::to_string_pretty(&table).map_err(|e| OptionsError::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, contents).map_err(|e| OptionsError::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn from_toml(definition: &OptionDefinition, raw: &toml::Value) -> Option<Value> {
    let value = match (definition.kind(), raw) {
        (ValueKind::Bool, toml::Value::Boolean(b)) => Value::Bool(*b),
        (ValueKind::Str, toml::Value::String(s)) => Value::Str(s.clone()),
        (ValueKind::Path, toml::Value::String(s)) => Value::Path(s.into()),
        (ValueKind::Int, toml::Value::Integer(i)) => Value::Int(*i),
        (ValueKind::UInt, toml::Value::Integer(i)) => Value::UInt(u64::try_from(*i).ok()?),
        (ValueKind::Float, toml::Value::Float(f)) => Value::Float(*f),
        (ValueKind::Float, toml::Value::Integer(i)) => Value::Float(exact_float(*i)?),
        _ => return None,
    };
    Some(value)
}

/// `None` unless `i` is exactly representable as an f64
fn exact_float(i: i64) -> Option<f64> {
    const MAX_EXACT: u64 = 1 << f64::MANTISSA_DIGITS;
    (i.unsigned_abs() <= MAX_EXACT).then_some(i as f64)
}

/// `None` for values TOML can't hold, i.e. unsigned integers above `i64::MAX`
/// and non UTF-8 paths
fn to_toml(value: &Value) -> Option<toml::Value> {
    let value = match value {
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Str(s) => toml::Value::String(s.clone()),
        Value::Int(i) => toml::Value::Integer(*i),
        Value::UInt(u) => toml::Value::Integer(i64::try_from(*u).ok()?),
        Value::Float(f) => toml::Value::Float(*f),
        Value::Path(p) => toml::Value::String(p.to_str()?.to_string()),
    };
    Some(value)
}
