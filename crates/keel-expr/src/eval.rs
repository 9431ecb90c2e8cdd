//! Lazy, dependency-driven evaluation over a single record.
//!
//! A [`Resolution`] is created for one call into the resolver. Field
//! references are resolved on demand: reading `a.b` first resolves any
//! expression stored at `a` or `a.b`, writes the result back into the record
//! and only then returns it. Paths being resolved are kept on a stack so a
//! field that (transitively) needs itself fails with
//! [`ExpressionError::CircularReference`] instead of recursing forever.
//!
//! A result is final. It is written back as-is, its path is marked resolved
//! on the record, and neither this nor a later resolution looks inside it
//! again. Resolving a record twice therefore gives the same
//! record as running it once.

use keel_core::value::{is_truthy, kind_name, to_display_string};
use keel_core::{ConfigRecord, ConfigValue};
use serde_json::Number;

use crate::error::{ExprResult, ExpressionError};
use crate::parser::{parse, BinaryOp, Expr, UnaryOp};
use crate::path::{member, PathSegment, ValuePath};
use crate::template::{self, has_expression, Part};
use crate::transform::{TransformRegistry, TransformScope};

pub(crate) struct Resolution<'r> {
    record: &'r mut ConfigRecord,
    transforms: &'r TransformRegistry,
    in_progress: Vec<ValuePath>,
    depth: usize,
    max_depth: usize,
}

impl<'r> Resolution<'r> {
    pub(crate) fn new(
        record: &'r mut ConfigRecord,
        transforms: &'r TransformRegistry,
        max_depth: usize,
    ) -> Self {
        Self {
            record,
            transforms,
            in_progress: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    pub(crate) fn record(&self) -> &ConfigRecord {
        self.record
    }

    fn is_ignored(&self, path: &ValuePath) -> bool {
        path.root_key().is_some_and(|key| self.record.is_ignored(key))
    }

    /// Whether `path` or one of its parents holds an expression result.
    fn is_settled(&self, path: &ValuePath) -> bool {
        let Some(key) = path.root_key() else {
            return false;
        };
        self.record.has_resolved(key)
            && (1..=path.len())
                .any(|len| self.record.is_resolved(key, &path.prefix(len).to_string()))
    }

    /// Resolves every expression-bearing field of the record in place.
    pub(crate) fn resolve_all(&mut self) -> ExprResult<()> {
        let keys: Vec<String> = self.record.keys().cloned().collect();
        for key in keys {
            self.resolve_subtree(&ValuePath::key(key))?;
        }
        Ok(())
    }

    fn resolve_subtree(&mut self, path: &ValuePath) -> ExprResult<()> {
        if self.is_ignored(path) || self.is_settled(path) {
            return Ok(());
        }
        let Some(value) = path.get(self.record.as_map()) else {
            return Ok(());
        };
        match value {
            ConfigValue::String(text) if has_expression(text) => {
                let text = text.clone();
                self.resolve_field(path, &text)
            }
            ConfigValue::Object(map) => {
                let keys: Vec<String> = map.keys().cloned().collect();
                for key in keys {
                    self.resolve_subtree(&path.child(PathSegment::Key(key)))?;
                }
                Ok(())
            }
            ConfigValue::Array(items) => {
                let len = items.len();
                for index in 0..len {
                    self.resolve_subtree(&path.child(PathSegment::Index(index)))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn resolve_field(&mut self, path: &ValuePath, text: &str) -> ExprResult<()> {
        if let Some(start) = self.in_progress.iter().position(|p| p == path) {
            let chain = self.in_progress[start..]
                .iter()
                .chain(std::iter::once(path))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ExpressionError::circular(path.to_string(), chain));
        }

        self.in_progress.push(path.clone());
        let outcome = self.eval_template(text);
        self.in_progress.pop();
        let value = outcome?;

        tracing::trace!(path = %path, kind = kind_name(&value), "resolved expression");
        self.write_back(path, value)
    }

    fn write_back(&mut self, path: &ValuePath, value: ConfigValue) -> ExprResult<()> {
        let Some(key) = path.root_key().map(str::to_string) else {
            return Err(ExpressionError::type_error("cannot write to an empty path"));
        };
        if !path.set(self.record.as_map_mut(), value) {
            return Err(ExpressionError::type_error(format!(
                "cannot write resolved value to `{path}`: its parent is gone"
            )));
        }
        self.record.mark_resolved(&key, path.to_string());
        Ok(())
    }

    /// Reads the value at `path`, resolving it and its parents first.
    ///
    /// Missing paths read as `null`.
    pub(crate) fn lookup(&mut self, path: &ValuePath) -> ExprResult<ConfigValue> {
        if !self.is_ignored(path) {
            for len in 1..path.len() {
                let prefix = path.prefix(len);
                let pending = match prefix.get(self.record.as_map()) {
                    None => break,
                    Some(value) => is_pending(value),
                };
                if pending {
                    self.resolve_subtree(&prefix)?;
                }
            }
            self.resolve_subtree(path)?;
        }

        if let Some(value) = path.get(self.record.as_map()) {
            return Ok(value.clone());
        }
        // Derived properties such as `list.length`.
        if path.len() > 1 {
            let parent = self.lookup(&path.prefix(path.len() - 1))?;
            if let Some(segment) = path.last() {
                return Ok(member(&parent, segment).unwrap_or(ConfigValue::Null));
            }
        }
        Ok(ConfigValue::Null)
    }

    fn enter(&mut self) -> ExprResult<()> {
        if self.depth >= self.max_depth {
            return Err(ExpressionError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Evaluates a template string.
    ///
    /// A template consisting of exactly one expression yields that
    /// expression's value unchanged; otherwise every part is rendered and
    /// concatenated.
    pub(crate) fn eval_template(&mut self, text: &str) -> ExprResult<ConfigValue> {
        self.enter()?;
        let result = self.eval_parts(text);
        self.depth -= 1;
        result
    }

    fn eval_parts(&mut self, text: &str) -> ExprResult<ConfigValue> {
        let parts = template::parse(text)?;
        if let [Part::Expr(expr)] = parts.as_slice() {
            return self.eval(expr);
        }
        let mut out = String::with_capacity(text.len());
        for part in &parts {
            match part {
                Part::Literal(literal) => out.push_str(literal),
                Part::Expr(expr) => out.push_str(&to_display_string(&self.eval(expr)?)),
            }
        }
        Ok(ConfigValue::String(out))
    }

    /// Evaluates a bare expression (no `${ }` wrapper).
    pub(crate) fn eval_source(&mut self, source: &str) -> ExprResult<ConfigValue> {
        self.enter()?;
        let result = parse(source).and_then(|expr| self.eval(&expr));
        self.depth -= 1;
        result
    }

    fn eval(&mut self, expr: &Expr) -> ExprResult<ConfigValue> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<ExprResult<Vec<_>>>()
                .map(ConfigValue::Array),
            Expr::Identifier(_) => {
                let path = self.static_path(expr)?.unwrap_or_default();
                self.lookup(&path)
            }
            Expr::Member { object, property } => {
                if let Some(path) = self.static_path(expr)? {
                    return self.lookup(&path);
                }
                let base = self.eval(object)?;
                let key = self.eval(property)?;
                Ok(member(&base, &PathSegment::from_value(&key)).unwrap_or(ConfigValue::Null))
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(ConfigValue::Bool(!is_truthy(&value))),
                    UnaryOp::Neg => number(-as_number(&value, "-")?),
                }
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if is_truthy(&self.eval(test)?) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
            Expr::Transform { name, input, args } => {
                let transforms = self.transforms;
                let transform = transforms
                    .get(name)
                    .ok_or_else(|| ExpressionError::unknown_transform(name))?;
                let input = self.eval(input)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<ExprResult<Vec<_>>>()?;
                transform(&mut TransformScope::new(self), input, args)
            }
        }
    }

    /// Builds the record path an identifier/member chain refers to, or `None`
    /// when the chain is rooted in a computed value.
    fn static_path(&mut self, expr: &Expr) -> ExprResult<Option<ValuePath>> {
        match expr {
            Expr::Identifier(name) => Ok(Some(ValuePath::key(name.clone()))),
            Expr::Member { object, property } => {
                let Some(mut path) = self.static_path(object)? else {
                    return Ok(None);
                };
                let key = self.eval(property)?;
                path.push(PathSegment::from_value(&key));
                Ok(Some(path))
            }
            _ => Ok(None),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> ExprResult<ConfigValue> {
        let lhs = self.eval(left)?;
        match op {
            BinaryOp::And => {
                return if is_truthy(&lhs) {
                    self.eval(right)
                } else {
                    Ok(lhs)
                };
            }
            BinaryOp::Or => {
                return if is_truthy(&lhs) {
                    Ok(lhs)
                } else {
                    self.eval(right)
                };
            }
            _ => {}
        }
        let rhs = self.eval(right)?;

        match op {
            BinaryOp::Add => add(&lhs, &rhs),
            BinaryOp::Sub => arithmetic(&lhs, &rhs, "-", i64::checked_sub, |a, b| a - b),
            BinaryOp::Mul => arithmetic(&lhs, &rhs, "*", i64::checked_mul, |a, b| a * b),
            BinaryOp::Div => {
                if as_number(&rhs, "/")? == 0.0 {
                    return Err(ExpressionError::type_error("division by zero"));
                }
                number(as_number(&lhs, "/")? / as_number(&rhs, "/")?)
            }
            BinaryOp::Rem => {
                if as_number(&rhs, "%")? == 0.0 {
                    return Err(ExpressionError::type_error("division by zero"));
                }
                arithmetic(&lhs, &rhs, "%", i64::checked_rem, |a, b| a % b)
            }
            BinaryOp::Eq => Ok(ConfigValue::Bool(loose_eq(&lhs, &rhs))),
            BinaryOp::NotEq => Ok(ConfigValue::Bool(!loose_eq(&lhs, &rhs))),
            BinaryOp::Lt => compare(&lhs, &rhs, "<").map(|o| ConfigValue::Bool(o.is_lt())),
            BinaryOp::Le => compare(&lhs, &rhs, "<=").map(|o| ConfigValue::Bool(o.is_le())),
            BinaryOp::Gt => compare(&lhs, &rhs, ">").map(|o| ConfigValue::Bool(o.is_gt())),
            BinaryOp::Ge => compare(&lhs, &rhs, ">=").map(|o| ConfigValue::Bool(o.is_ge())),
            BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled above"),
        }
    }
}

fn is_pending(value: &ConfigValue) -> bool {
    matches!(value, ConfigValue::String(text) if has_expression(text))
}

fn as_number(value: &ConfigValue, op: &str) -> ExprResult<f64> {
    match value {
        ConfigValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| ExpressionError::type_error(format!("number {n} out of range"))),
        other => Err(ExpressionError::type_error(format!(
            "operator `{op}` expects numbers, got {}",
            kind_name(other)
        ))),
    }
}

/// Converts an `f64` result back into a value, keeping integral results
/// integral.
fn number(value: f64) -> ExprResult<ConfigValue> {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        return Ok(ConfigValue::from(value as i64));
    }
    Number::from_f64(value)
        .map(ConfigValue::Number)
        .ok_or_else(|| ExpressionError::type_error(format!("{value} is not a finite number")))
}

fn arithmetic(
    lhs: &ConfigValue,
    rhs: &ConfigValue,
    op: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> ExprResult<ConfigValue> {
    if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
        if let Some(result) = int_op(a, b) {
            return Ok(ConfigValue::from(result));
        }
    }
    number(float_op(as_number(lhs, op)?, as_number(rhs, op)?))
}

fn add(lhs: &ConfigValue, rhs: &ConfigValue) -> ExprResult<ConfigValue> {
    match (lhs, rhs) {
        (ConfigValue::String(_), _) | (_, ConfigValue::String(_)) => Ok(ConfigValue::String(
            format!("{}{}", to_display_string(lhs), to_display_string(rhs)),
        )),
        (ConfigValue::Array(a), ConfigValue::Array(b)) => {
            Ok(ConfigValue::Array(a.iter().chain(b).cloned().collect()))
        }
        _ => arithmetic(lhs, rhs, "+", i64::checked_add, |a, b| a + b),
    }
}

fn loose_eq(lhs: &ConfigValue, rhs: &ConfigValue) -> bool {
    match (lhs, rhs) {
        (ConfigValue::Number(a), ConfigValue::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

fn compare(lhs: &ConfigValue, rhs: &ConfigValue, op: &str) -> ExprResult<std::cmp::Ordering> {
    match (lhs, rhs) {
        (ConfigValue::String(a), ConfigValue::String(b)) => Ok(a.cmp(b)),
        _ => {
            let (a, b) = (as_number(lhs, op)?, as_number(rhs, op)?);
            a.partial_cmp(&b)
                .ok_or_else(|| ExpressionError::type_error(format!("cannot compare {a} and {b}")))
        }
    }
}
