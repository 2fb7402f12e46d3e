//! Builtin operator handler tables.
//!
//! Handlers are keyed by the same synthetic names used for user overloads,
//! so dispatch consults this table first and only falls back to a user
//! defined `__op_...` function on a miss.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::lexer::Token;
use crate::package_unit::{operator_override_name, OperatorDef};
use crate::types::Type;

use super::error::{RResult, RuntimeError};
use super::variable::{Variable, VarRef};

pub type BinaryOperatorHandler = fn(&VarRef, &VarRef) -> RResult<Variable>;
pub type UnaryOperatorHandler = fn(&VarRef) -> RResult<Variable>;

pub struct Operator {
    binary_handles: HashMap<String, BinaryOperatorHandler>,
    unary_handles: HashMap<String, UnaryOperatorHandler>,
}

static OPERATOR: Lazy<Operator> = Lazy::new(Operator::build);

impl Operator {
    pub fn instance() -> &'static Operator {
        &OPERATOR
    }

    /// Calculate `left op right` with the builtin handlers; `None` means no
    /// builtin handler exists for the operand types.
    pub fn calculate_binary(
        &self,
        op: &Token,
        left: &VarRef,
        right: &VarRef,
    ) -> Option<RResult<Variable>> {
        let operands = [
            left.borrow().ty().clone(),
            right.borrow().ty().clone(),
        ];
        let name = operator_override_name(OperatorDef::op_str(op), &operands);
        let handle = self.binary_handles.get(&name)?;
        Some(handle(left, right))
    }

    pub fn calculate_unary(&self, op: &Token, operand: &VarRef) -> Option<RResult<Variable>> {
        let operands = [operand.borrow().ty().clone()];
        let name = operator_override_name(OperatorDef::op_str(op), &operands);
        let handle = self.unary_handles.get(&name)?;
        Some(handle(operand))
    }

    fn build() -> Operator {
        let mut binary_handles: HashMap<String, BinaryOperatorHandler> = HashMap::new();
        let mut unary_handles: HashMap<String, UnaryOperatorHandler> = HashMap::new();

        let int2 = [Type::int(), Type::int()];
        let double2 = [Type::double(), Type::double()];
        let string2 = [Type::string(), Type::string()];
        let bool2 = [Type::boolean(), Type::boolean()];

        // operator +
        binary_handles.insert(operator_override_name("+", &int2), |l, r| {
            Ok(Variable::from_int(
                l.borrow().int_value()? + r.borrow().int_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("+", &double2), |l, r| {
            Ok(Variable::from_double(
                l.borrow().double_value()? + r.borrow().double_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("+", &string2), |l, r| {
            Ok(Variable::from_string(
                l.borrow().string_value()? + &r.borrow().string_value()?,
            ))
        });

        // operator - and * for int and double
        binary_handles.insert(operator_override_name("-", &int2), |l, r| {
            Ok(Variable::from_int(
                l.borrow().int_value()? - r.borrow().int_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("-", &double2), |l, r| {
            Ok(Variable::from_double(
                l.borrow().double_value()? - r.borrow().double_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("*", &int2), |l, r| {
            Ok(Variable::from_int(
                l.borrow().int_value()? * r.borrow().int_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("*", &double2), |l, r| {
            Ok(Variable::from_double(
                l.borrow().double_value()? * r.borrow().double_value()?,
            ))
        });

        // operator /, integer division by zero is a runtime error
        binary_handles.insert(operator_override_name("/", &int2), |l, r| {
            let rv = r.borrow().int_value()?;
            if rv == 0 {
                return Err(RuntimeError::new("divide by zero"));
            }
            Ok(Variable::from_int(l.borrow().int_value()? / rv))
        });
        binary_handles.insert(operator_override_name("/", &double2), |l, r| {
            Ok(Variable::from_double(
                l.borrow().double_value()? / r.borrow().double_value()?,
            ))
        });

        // relational operators
        binary_handles.insert(operator_override_name("<", &int2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().int_value()? < r.borrow().int_value()?,
            ))
        });
        binary_handles.insert(operator_override_name(">", &int2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().int_value()? > r.borrow().int_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("<=", &int2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().int_value()? <= r.borrow().int_value()?,
            ))
        });
        binary_handles.insert(operator_override_name(">=", &int2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().int_value()? >= r.borrow().int_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("<", &double2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().double_value()? < r.borrow().double_value()?,
            ))
        });
        binary_handles.insert(operator_override_name(">", &double2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().double_value()? > r.borrow().double_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("<=", &double2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().double_value()? <= r.borrow().double_value()?,
            ))
        });
        binary_handles.insert(operator_override_name(">=", &double2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().double_value()? >= r.borrow().double_value()?,
            ))
        });

        // operator && and ||, both operands are always evaluated before
        // dispatch reaches these handlers
        binary_handles.insert(operator_override_name("&&", &bool2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().bool_value()? && r.borrow().bool_value()?,
            ))
        });
        binary_handles.insert(operator_override_name("||", &bool2), |l, r| {
            Ok(Variable::from_bool(
                l.borrow().bool_value()? || r.borrow().bool_value()?,
            ))
        });

        // unary operators
        unary_handles.insert(operator_override_name("-", &[Type::int()]), |v| {
            Ok(Variable::from_int(-v.borrow().int_value()?))
        });
        unary_handles.insert(operator_override_name("-", &[Type::double()]), |v| {
            Ok(Variable::from_double(-v.borrow().double_value()?))
        });
        unary_handles.insert(operator_override_name("!", &[Type::boolean()]), |v| {
            Ok(Variable::from_bool(!v.borrow().bool_value()?))
        });

        Operator {
            binary_handles,
            unary_handles,
        }
    }
}
