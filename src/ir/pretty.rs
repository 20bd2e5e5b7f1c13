use std::fmt::{self, Display, Write};

use super::{BoundRule, Expr, Guard, Outcome, TempId};
use crate::error::Result;

/// Consumer of finished rules, typically a host compiler lowering them to code.
pub trait FragmentCompiler {
    type Output;

    fn compile(&mut self, rule: &BoundRule) -> Result<Self::Output>;
}

/// Compiler producing the textual rendering of each rule.
#[derive(Debug, Default)]
pub struct TextCompiler {
    compiled: usize,
}

impl TextCompiler {
    #[must_use]
    pub fn compiled(&self) -> usize {
        self.compiled
    }
}

impl FragmentCompiler for TextCompiler {
    type Output = String;

    fn compile(&mut self, rule: &BoundRule) -> Result<String> {
        self.compiled += 1;
        Ok(render_rule(rule))
    }
}

/// Multi-line rendering used by diagnostics dumps and snapshot tests.
#[must_use]
pub fn render_rule(rule: &BoundRule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "rule {} -> {}", rule.outcome, rule.result_ty);
    for guard in &rule.guards {
        let _ = writeln!(out, "  guard {guard}");
    }
    for temp in &rule.temps {
        let _ = writeln!(out, "  temp {temp}");
    }
    let _ = write!(out, "  body {}", rule.body);
    out
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Value => "value",
            Outcome::Thrown => "thrown",
            Outcome::ContinueResolution => "continue",
        })
    }
}

impl Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::TypeExact { target, ty } => write!(f, "typeof({target}) == {ty}"),
            Guard::Instance { target, key } => write!(f, "{target} is {key}"),
            Guard::NotNull { target } => write!(f, "{target} != null"),
            Guard::Length { target, len } => write!(f, "len({target}) == {len}"),
            Guard::Keys { target, keys } => {
                let keys = keys.iter().map(|key| &**key).collect::<Vec<_>>().join(", ");
                write!(f, "keys({target}) == [{keys}]")
            }
            Guard::Test(expr) => write!(f, "{expr}"),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, items: &[Expr], separator: &str) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Input(index) => write!(f, "${index}"),
            Expr::Variable(name) => f.write_str(name),
            Expr::Temp(temp) => write!(f, "{temp}"),
            Expr::Field { target, field } => match target {
                Some(target) => write!(f, "{target}.{}", field.name),
                None => write!(f, "{}::{}", field.declaring, field.name),
            },
            Expr::Call {
                target,
                callee,
                args,
            } => {
                match target {
                    Some(target) => write!(f, "{target}.{}(", callee.name)?,
                    None => write!(f, "{}::{}(", callee.declaring, callee.name)?,
                }
                join(f, args, ", ")?;
                f.write_str(")")
            }
            Expr::New { ty, args, .. } => {
                write!(f, "new {ty}(")?;
                join(f, args, ", ")?;
                f.write_str(")")
            }
            Expr::Assign { target, value } => write!(f, "{target} = {value}"),
            Expr::Block { temps, body } => {
                f.write_str("{ ")?;
                if !temps.is_empty() {
                    f.write_str("let ")?;
                    for (index, temp) in temps.iter().enumerate() {
                        if index > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{temp}")?;
                    }
                    f.write_str("; ")?;
                }
                join(f, body, "; ")?;
                f.write_str(" }")
            }
            Expr::Condition {
                test,
                then,
                otherwise,
                ..
            } => write!(f, "(if {test} then {then} else {otherwise})"),
            Expr::Throw {
                diagnostic, light, ..
            } => {
                let keyword = if *light { "throw-light" } else { "throw" };
                write!(
                    f,
                    "{keyword} {}({:?})",
                    diagnostic.code.code, diagnostic.message
                )
            }
            Expr::Convert { value, to } => write!(f, "({value} as {to})"),
            Expr::TypeIs { value, ty } => write!(f, "({value} is {ty})"),
            Expr::Binary {
                op,
                left,
                right,
                method,
            } => match method {
                Some(method) => write!(
                    f,
                    "({left} {op} {right} via {}::{})",
                    method.declaring, method.name
                ),
                None => write!(f, "({left} {op} {right})"),
            },
            Expr::Unary { op, operand } => write!(f, "({op}{operand})"),
            Expr::ArrayIndex { array, index } => write!(f, "{array}[{index}]"),
            Expr::MapGet { map, key } => write!(f, "{map}[{key:?}]"),
            Expr::BuildArray { items, .. } => {
                f.write_str("[")?;
                join(f, items, ", ")?;
                f.write_str("]")
            }
            Expr::BuildMap { entries } => {
                f.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Expr::WrapperValue(inner) => write!(f, "{inner}.Value"),
            Expr::Default(ty) => write!(f, "default({ty})"),
            Expr::TryDefault { body, ty } => write!(f, "try {body} else default({ty})"),
            Expr::MemberValue(member) => {
                write!(f, "member({}::{})", member.declaring(), member.name())
            }
            Expr::MakeBound { member, instance } => {
                write!(f, "bind({instance}, {}::{})", member.declaring(), member.name())
            }
            Expr::BoundInstance(inner) => write!(f, "instance({inner})"),
            Expr::OperationFailed => f.write_str("<operation-failed>"),
            Expr::ContinueResolution => f.write_str("<continue>"),
            Expr::Rebind { constituent, args } => {
                write!(f, "rebind#{constituent}(")?;
                join(f, args, ", ")?;
                f.write_str(")")
            }
            Expr::Dynamic { action, args } => {
                write!(f, "dynamic {action}(")?;
                join(f, args, ", ")?;
                f.write_str(")")
            }
        }
    }
}
