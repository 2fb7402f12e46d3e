//! Lexical contexts and the stack the semantic analyser maintains.
//!
//! The global context is level 0 and unique; function and method contexts are
//! level 1 and sit directly on the global one; block, for and while contexts
//! are level 2 and nest freely.

use std::collections::HashMap;

use crate::ast::CaptureIdItem;
use crate::package_unit::{find_by_name, PackageUnit, Param};
use crate::types::Type;

use super::error::{TResult, TypeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextKind {
    Global,
    Func {
        func_name: String,
    },
    Method {
        type_name: String,
        method_name: String,
    },
    Block,
    ForBlock,
    WhileBlock,
}

#[derive(Debug)]
pub struct Context {
    kind: ContextKind,
    vars: HashMap<String, Type>,
}

impl Context {
    pub fn new(kind: ContextKind) -> Self {
        Context {
            kind,
            vars: HashMap::new(),
        }
    }

    pub fn func(func_name: impl Into<String>) -> Self {
        Context::new(ContextKind::Func {
            func_name: func_name.into(),
        })
    }

    pub fn method(type_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Context::new(ContextKind::Method {
            type_name: type_name.into(),
            method_name: method_name.into(),
        })
    }

    pub fn kind(&self) -> &ContextKind {
        &self.kind
    }

    pub fn level(&self) -> usize {
        match self.kind {
            ContextKind::Global => 0,
            ContextKind::Func { .. } | ContextKind::Method { .. } => 1,
            _ => 2,
        }
    }

    /// Names within one context are unique.
    pub fn register_variable(&mut self, name: &str, ty: Type) -> TResult<()> {
        if self.vars.contains_key(name) {
            return Err(TypeError::check(
                "register variable",
                format!("duplicate name {name}"),
            ));
        }
        self.vars.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn get_type_by_name(&self, name: &str) -> Option<Type> {
        find_by_name(&self.vars, name).cloned()
    }
}

#[derive(Debug)]
pub enum FindNameResult {
    /// A variable visible from the current context.
    Object(Type),
    /// A free function of the package unit.
    Function(Type),
    NotFound,
}

/// The context-stack half of the semantic analyser. Lookup searches from the
/// innermost context outward but stops at the nearest function or method
/// boundary, falling back directly to the global context and then to the
/// package's functions.
#[derive(Debug)]
pub struct StaticAnalyzer<'a> {
    pu: &'a PackageUnit,
    global_context: Context,
    context_stack: Vec<Context>,
}

impl<'a> StaticAnalyzer<'a> {
    pub fn new(pu: &'a PackageUnit) -> Self {
        StaticAnalyzer {
            pu,
            global_context: Context::new(ContextKind::Global),
            context_stack: vec![],
        }
    }

    pub fn pu(&self) -> &'a PackageUnit {
        self.pu
    }

    pub fn enter(&mut self, context: Context) {
        self.context_stack.push(context);
    }

    pub fn leave(&mut self) {
        debug_assert!(!self.context_stack.is_empty());
        self.context_stack.pop();
    }

    pub fn current_context_mut(&mut self) -> &mut Context {
        match self.context_stack.last_mut() {
            Some(context) => context,
            None => &mut self.global_context,
        }
    }

    pub fn find_name(&self, name: &str) -> FindNameResult {
        for context in self.context_stack.iter().rev() {
            if context.level() == 1 {
                // function and method scopes fall back straight to globals
                if let Some(ty) = context.get_type_by_name(name) {
                    return FindNameResult::Object(ty);
                }
                break;
            }
            if let Some(ty) = context.get_type_by_name(name) {
                return FindNameResult::Object(ty);
            }
        }
        if let Some(ty) = self.global_context.get_type_by_name(name) {
            return FindNameResult::Object(ty);
        }
        if let Some(func) = self.pu.find_function(name) {
            return FindNameResult::Function(func.func_type());
        }
        FindNameResult::NotFound
    }

    /// The struct a `self` expression refers to; legal only below a method
    /// context.
    pub fn check_method_context_and_get_type_name(&self) -> TResult<String> {
        for context in self.context_stack.iter().rev() {
            if context.level() == 2 {
                continue;
            }
            if let ContextKind::Method { type_name, .. } = context.kind() {
                return Ok(type_name.clone());
            }
            break;
        }
        Err(TypeError::check(
            "check self expression",
            "self is only valid in method context",
        ))
    }

    /// continue/break must sit inside a for or while context, without a
    /// function or method boundary in between.
    pub fn check_for_or_while_context(&self) -> TResult<()> {
        for context in self.context_stack.iter().rev() {
            if context.level() == 1 {
                break;
            }
            if matches!(
                context.kind(),
                ContextKind::ForBlock | ContextKind::WhileBlock
            ) {
                return Ok(());
            }
        }
        Err(TypeError::check(
            "check continue/break statement",
            "not in a for or while context",
        ))
    }

    /// The declared return type of the enclosing function or method.
    pub fn check_func_or_method_and_get_return_type(&self) -> TResult<Type> {
        for context in self.context_stack.iter().rev() {
            if context.level() == 2 {
                continue;
            }
            match context.kind() {
                ContextKind::Func { func_name } => {
                    let func = self.pu.find_function(func_name).ok_or_else(|| {
                        TypeError::check(
                            "check return statement",
                            format!("function {func_name} not exist"),
                        )
                    })?;
                    return Ok(func.return_type.clone());
                }
                ContextKind::Method {
                    type_name,
                    method_name,
                } => {
                    let method =
                        self.pu
                            .find_type_method(type_name, method_name)
                            .ok_or_else(|| {
                                TypeError::check(
                                    "check return statement",
                                    format!("method {type_name}.{method_name} not exist"),
                                )
                            })?;
                    return Ok(method.return_type.clone());
                }
                _ => break,
            }
        }
        Err(TypeError::check(
            "check return statement",
            "not in a function or method context",
        ))
    }

    pub fn register_params_to_context(
        &self,
        params: &[Param],
        context: &mut Context,
    ) -> TResult<()> {
        for param in params {
            context.register_variable(&param.name, param.ty.clone())?;
        }
        Ok(())
    }

    /// Capture ids are resolved in the enclosing scope at the point of the
    /// lambda expression; functions can not be captured.
    pub fn register_capture_ids_to_context(
        &self,
        items: &[CaptureIdItem],
        context: &mut Context,
    ) -> TResult<()> {
        for item in items {
            match self.find_name(&item.id) {
                FindNameResult::Object(ty) => context.register_variable(&item.id, ty)?,
                _ => {
                    return Err(TypeError::check(
                        "register capture ids",
                        format!("invalid or function id name {}", item.id),
                    ))
                }
            }
        }
        Ok(())
    }
}
