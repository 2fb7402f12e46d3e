//! Semantic analysis: context-sensitive checks over a merged package unit.
//!
//! `check_all` runs in a fixed order: declared types first, then the struct
//! dependency graph, then the global definitions in source order, then every
//! function and method body together with the deterministic-return analysis.

mod context;
mod error;
mod graph;

pub use context::{Context, ContextKind, FindNameResult, StaticAnalyzer};
pub use error::{TResult, TypeError};
pub use graph::Graph;

use log::debug;

use crate::ast::{BlockStmt, Expression, Statement, VariableDefineStmt};
use crate::interpreter::inner_method::{is_inner_type, InnerTypeMethod};
use crate::lexer::Token;
use crate::package_unit::{
    is_lambda_name, operator_override_name, FunctionDef, MethodDef, OperatorDef, PackageUnit,
};
use crate::types::{check_can_construct_by, is_same_type, Type, BUILTIN_TYPES_WITHOUT_VOID};

pub struct TypeChecker<'a> {
    analyzer: StaticAnalyzer<'a>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(pu: &'a PackageUnit) -> Self {
        TypeChecker {
            analyzer: StaticAnalyzer::new(pu),
        }
    }

    fn pu(&self) -> &'a PackageUnit {
        self.analyzer.pu()
    }

    /// Run every check. A unit that passes is safe to hand to the executor.
    pub fn check_all(&mut self) -> TResult<()> {
        debug!("check declared types");
        self.check_types()?;
        debug!("check struct dependencies");
        self.check_structs()?;
        debug!("check global variables");
        self.check_and_register_global_variables()?;
        debug!("check functions");
        self.check_functions()?;
        debug!("check methods");
        self.check_methods()?;
        Ok(())
    }

    fn with_context<T>(
        &mut self,
        context: Context,
        f: impl FnOnce(&mut Self) -> TResult<T>,
    ) -> TResult<T> {
        self.analyzer.enter(context);
        let result = f(self);
        self.analyzer.leave();
        result
    }

    // stage 1 : every declared type is well formed

    fn check_types(&self) -> TResult<()> {
        let pu = self.pu();
        for vd in pu.global_var_def_stmts() {
            self.check_type(
                &vd.ty,
                &format!("check global variable {}'s type {}", vd.var_name, vd.ty),
                false,
            )?;
        }
        for (name, func) in pu.funcs() {
            for param in &func.params {
                self.check_type(
                    &param.ty,
                    &format!("check function {} param {}'s type {}", name, param.name, param.ty),
                    false,
                )?;
            }
            self.check_type(
                &func.return_type,
                &format!("check function {} return type {}", name, func.return_type),
                true,
            )?;
        }
        for (name, struct_def) in pu.structs() {
            for (field, ty) in struct_def.data_members() {
                self.check_type(
                    ty,
                    &format!("check struct {name} member {field}'s type {ty}"),
                    false,
                )?;
            }
            for method in struct_def.methods() {
                for param in &method.params {
                    self.check_type(
                        &param.ty,
                        &format!(
                            "check struct {} method {} param {}'s type {}",
                            name, method.method_name, param.name, param.ty
                        ),
                        false,
                    )?;
                }
                self.check_type(
                    &method.return_type,
                    &format!(
                        "check struct {} method {} return type {}",
                        name, method.method_name, method.return_type
                    ),
                    true,
                )?;
            }
        }
        Ok(())
    }

    fn check_type(&self, ty: &Type, context_info: &str, can_be_void: bool) -> TResult<()> {
        match ty {
            Type::Func { params, ret } => {
                for param in params {
                    self.check_type(param, context_info, false)?;
                }
                self.check_type(ret, context_info, true)
            }
            Type::Pointer(inner) => self.check_type(inner, context_info, false),
            Type::List(element) => self.check_type(element, context_info, false),
            Type::Basic(_) => {
                if ty.is_builtin() {
                    if !can_be_void && ty.is_void() {
                        return Err(TypeError::check(context_info, "invalid void type"));
                    }
                    Ok(())
                } else if self.pu().find_struct(&ty.type_info()).is_some() {
                    Ok(())
                } else {
                    Err(TypeError::check(
                        context_info,
                        format!("invalid struct type {ty}"),
                    ))
                }
            }
        }
    }

    // stage 2 : the struct dependency graph is acyclic

    fn check_structs(&self) -> TResult<()> {
        let pu = self.pu();
        let mut graph = Graph::new();
        for each in BUILTIN_TYPES_WITHOUT_VOID {
            graph.add_node(each.to_string());
        }
        for name in pu.structs().keys() {
            graph.add_node(name.clone());
        }
        for (name, struct_def) in pu.structs() {
            for to in struct_def.dependent() {
                graph.add_edge(name.clone(), to);
            }
        }
        if !graph.topological_sort() {
            return Err(TypeError::check(
                "check struct dependencies",
                "struct dependent check error, cycle detected",
            ));
        }
        Ok(())
    }

    // stage 3 : globals in source order, forward references rejected

    fn check_and_register_global_variables(&mut self) -> TResult<()> {
        for vd in self.pu().global_var_def_stmts() {
            self.check_variable_define(vd)?;
        }
        Ok(())
    }

    // stage 4/5 : function and method bodies

    fn check_functions(&mut self) -> TResult<()> {
        for (name, func) in self.pu().funcs() {
            // lambda bodies are checked at the lambda expression, where the
            // captured identifiers are in scope
            if is_lambda_name(name) {
                continue;
            }
            let mut context = Context::func(name.clone());
            self.analyzer
                .register_params_to_context(&func.params, &mut context)?;
            self.with_context(context, |tc| {
                for stmt in &func.block.stmts {
                    tc.check_statement(stmt)?;
                }
                Ok(())
            })?;
            self.check_deterministic_return_func(func)?;
        }
        Ok(())
    }

    fn check_methods(&mut self) -> TResult<()> {
        for (struct_name, struct_def) in self.pu().structs() {
            for method in struct_def.methods() {
                // the destructor hook runs on dealloc and must be `() -> void`
                if method.method_name == "destructor"
                    && (!method.params.is_empty() || !method.return_type.is_void())
                {
                    return Err(TypeError::check(
                        format!("check struct {struct_name} method destructor"),
                        "destructor must take no parameters and return void",
                    ));
                }
                let block = match &method.block {
                    Some(block) => block,
                    // trait method declarations carry no body
                    None => continue,
                };
                let mut context =
                    Context::method(struct_name.clone(), method.method_name.clone());
                self.analyzer
                    .register_params_to_context(&method.params, &mut context)?;
                self.with_context(context, |tc| {
                    for stmt in &block.stmts {
                        tc.check_statement(stmt)?;
                    }
                    Ok(())
                })?;
                self.check_deterministic_return_method(struct_name, method)?;
            }
        }
        Ok(())
    }

    // statements

    pub fn check_statement(&mut self, stmt: &Statement) -> TResult<()> {
        match stmt {
            Statement::Block(block) => {
                self.with_context(Context::new(ContextKind::Block), |tc| {
                    for each in &block.stmts {
                        tc.check_statement(each)?;
                    }
                    Ok(())
                })
            }
            Statement::If {
                check,
                if_block,
                else_block,
            } => {
                let check_type = self.get_expression_type(check)?;
                if !check_type.is_bool() {
                    return Err(TypeError::check(
                        "check if_stmt",
                        format!("check expr should have bool type, but {check_type}"),
                    ));
                }
                self.check_nested_block(ContextKind::Block, if_block)?;
                if let Some(else_block) = else_block {
                    self.check_nested_block(ContextKind::Block, else_block)?;
                }
                Ok(())
            }
            Statement::While { check, block } => {
                let check_type = self.get_expression_type(check)?;
                if !check_type.is_bool() {
                    return Err(TypeError::check(
                        "check while_stmt",
                        format!("check expr should have bool type, but {check_type}"),
                    ));
                }
                self.check_nested_block(ContextKind::WhileBlock, block)
            }
            Statement::For {
                init,
                check,
                update,
                block,
            } => self.with_context(Context::new(ContextKind::ForBlock), |tc| {
                tc.get_expression_type(init)?;
                let check_type = tc.get_expression_type(check)?;
                if !check_type.is_bool() {
                    return Err(TypeError::check(
                        "check for_stmt",
                        format!("check expr should have bool type, but {check_type}"),
                    ));
                }
                tc.get_expression_type(update)?;
                for each in &block.stmts {
                    tc.check_statement(each)?;
                }
                Ok(())
            }),
            Statement::Break | Statement::Continue => self.analyzer.check_for_or_while_context(),
            Statement::Return(expr) => {
                let defined = self.analyzer.check_func_or_method_and_get_return_type()?;
                match expr {
                    Some(expr) => {
                        let return_type = self.get_expression_type(expr)?;
                        if !is_same_type(&return_type, &defined) {
                            return Err(TypeError::check(
                                "check return_stmt",
                                format!("return type dismatch, {defined} != {return_type}"),
                            ));
                        }
                    }
                    None => {
                        if !defined.is_void() {
                            return Err(TypeError::check(
                                "check return_stmt",
                                format!("defined return type {defined}, but return nothing"),
                            ));
                        }
                    }
                }
                Ok(())
            }
            Statement::Expression(expr) => {
                self.get_expression_type(expr)?;
                Ok(())
            }
            Statement::VariableDefine(vd) => self.check_variable_define(vd),
        }
    }

    fn check_nested_block(&mut self, kind: ContextKind, block: &BlockStmt) -> TResult<()> {
        self.with_context(Context::new(kind), |tc| {
            for each in &block.stmts {
                tc.check_statement(each)?;
            }
            Ok(())
        })
    }

    fn check_variable_define(&mut self, vd: &VariableDefineStmt) -> TResult<()> {
        let context_info = format!("check variable {}'s type {}", vd.var_name, vd.ty);
        self.check_type(&vd.ty, &context_info, false)?;
        if vd.is_ref {
            if vd.constructors.len() != 1 {
                return Err(TypeError::check(
                    &context_info,
                    "ref binding needs exactly one expression",
                ));
            }
            let bound = self.get_expression_type(&vd.constructors[0])?;
            if !is_same_type(&bound, &vd.ty) {
                return Err(TypeError::check(
                    &context_info,
                    format!("ref binding type dismatch, {} != {}", vd.ty, bound),
                ));
            }
        } else {
            let mut params_type = vec![];
            for each in &vd.constructors {
                params_type.push(self.get_expression_type(each)?);
            }
            check_can_construct_by(self.pu(), &vd.ty, &params_type)
                .map_err(|reason| TypeError::check(&context_info, reason))?;
        }
        self.analyzer
            .current_context_mut()
            .register_variable(&vd.var_name, vd.ty.clone())
    }

    // expressions

    pub fn get_expression_type(&mut self, expr: &Expression) -> TResult<Type> {
        match expr {
            Expression::StringLiteral(_) => Ok(Type::string()),
            Expression::IntLiteral(_) => Ok(Type::int()),
            Expression::DoubleLiteral(_) => Ok(Type::double()),
            Expression::BoolLiteral(_) => Ok(Type::boolean()),
            Expression::ByteLiteral(_) => Ok(Type::byte()),
            Expression::VoidLiteral => Ok(Type::void()),
            Expression::Id(name) => match self.analyzer.find_name(name) {
                FindNameResult::Object(ty) => Ok(ty),
                FindNameResult::Function(ty) => Ok(ty),
                FindNameResult::NotFound => Err(TypeError::check(
                    "check id expression",
                    format!("undefined identifier {name}"),
                )),
            },
            Expression::SelfObject => {
                let type_name = self.analyzer.check_method_context_and_get_type_name()?;
                Ok(Type::basic(type_name))
            }
            Expression::Binary { op, left, right } => {
                self.get_binary_expression_type(op, left, right)
            }
            Expression::Unary { op, operand } => {
                let operand_type = self.get_expression_type(operand)?;
                check_and_get_unary_operator_result_type(op, operand_type)
            }
            Expression::FuncCall { func_name, args } => self.get_func_call_type(func_name, args),
            Expression::MethodCall {
                id_name,
                method_name,
                args,
            } => self.get_method_call_type(id_name, method_name, args),
            Expression::Lambda {
                func_name,
                captures,
            } => {
                let def = self.pu().find_function(func_name).ok_or_else(|| {
                    TypeError::check(
                        "check lambda expression",
                        format!("lambda {func_name} not registered"),
                    )
                })?;
                let mut context = Context::func(func_name.clone());
                self.analyzer
                    .register_capture_ids_to_context(captures, &mut context)?;
                self.analyzer
                    .register_params_to_context(&def.params, &mut context)?;
                self.with_context(context, |tc| {
                    for stmt in &def.block.stmts {
                        tc.check_statement(stmt)?;
                    }
                    Ok(())
                })?;
                self.check_deterministic_return_func(def)?;
                Ok(def.func_type())
            }
            Expression::New { ty, args } => {
                self.check_construct_expression("check new expression", ty, args)?;
                Ok(ty.clone())
            }
            Expression::Alloc { ty, args } => {
                self.check_construct_expression("check alloc expression", ty, args)?;
                Ok(Type::pointer_to(ty.clone()))
            }
            Expression::Dealloc(operand) => {
                let operand_type = self.get_expression_type(operand)?;
                if !operand_type.is_ptr() {
                    return Err(TypeError::check(
                        "check dealloc expression",
                        format!("operand should have pointer type, but {operand_type}"),
                    ));
                }
                Ok(Type::void())
            }
            Expression::Move(id) => match self.analyzer.find_name(id) {
                FindNameResult::Object(ty) => Ok(ty),
                _ => Err(TypeError::check(
                    "check move expression",
                    format!("invalid or function id name {id}"),
                )),
            },
            Expression::As { operand, ty } => {
                let operand_type = self.get_expression_type(operand)?;
                if is_same_type(&operand_type, ty) {
                    return Ok(ty.clone());
                }
                let context_info = format!("check cast {operand_type} as {ty}");
                let concrete = self
                    .pu()
                    .find_struct(&operand_type.type_info())
                    .ok_or_else(|| {
                        TypeError::check(&context_info, "operand is not a struct type")
                    })?;
                let trait_def = self.pu().find_struct(&ty.type_info()).ok_or_else(|| {
                    TypeError::check(&context_info, "target is not a struct type")
                })?;
                if !trait_def.is_trait() {
                    return Err(TypeError::check(&context_info, "target is not a trait"));
                }
                for (field, field_type) in trait_def.data_members() {
                    match concrete.get_data_member_type(field) {
                        Some(t) if is_same_type(t, field_type) => {}
                        _ => {
                            return Err(TypeError::check(
                                &context_info,
                                format!("field {field} : {field_type} not satisfied"),
                            ))
                        }
                    }
                }
                for decl in trait_def.methods() {
                    match concrete.get_method(&decl.method_name) {
                        Some(m) if is_same_type(&m.func_type(), &decl.func_type()) => {}
                        _ => {
                            return Err(TypeError::check(
                                &context_info,
                                format!(
                                    "method {} : {} not satisfied",
                                    decl.method_name,
                                    decl.func_type()
                                ),
                            ))
                        }
                    }
                }
                Ok(ty.clone())
            }
        }
    }

    fn check_construct_expression(
        &mut self,
        context_info: &str,
        ty: &Type,
        args: &[Expression],
    ) -> TResult<()> {
        self.check_type(ty, context_info, false)?;
        let mut params_type = vec![];
        for each in args {
            params_type.push(self.get_expression_type(each)?);
        }
        check_can_construct_by(self.pu(), ty, &params_type)
            .map_err(|reason| TypeError::check(context_info, reason))
    }

    fn get_binary_expression_type(
        &mut self,
        op: &Token,
        left: &Expression,
        right: &Expression,
    ) -> TResult<Type> {
        if *op == Token::MemberAccess {
            let left_type = self.get_expression_type(left)?;
            let Expression::Id(field) = right else {
                return Err(TypeError::check(
                    "check member access",
                    "right operand should be an id expression",
                ));
            };
            if !left_type.is_struct() {
                return Err(TypeError::check(
                    "check member access",
                    format!("left operand should have struct type, but {left_type}"),
                ));
            }
            return self
                .pu()
                .get_data_member_type(&left_type.type_info(), field)
                .map_err(|reason| TypeError::check("check member access", reason));
        }
        if *op == Token::Subscript {
            let right_type = self.get_expression_type(right)?;
            if !right_type.is_int() {
                return Err(TypeError::check(
                    "check subscript",
                    format!("index should have int type, but {right_type}"),
                ));
            }
            let left_type = self.get_expression_type(left)?;
            return match left_type.element_type() {
                Some(element) => Ok(element.clone()),
                None => Err(TypeError::check(
                    "check subscript",
                    format!("operand should have list type, but {left_type}"),
                )),
            };
        }

        let left_type = self.get_expression_type(left)?;
        let right_type = self.get_expression_type(right)?;
        match check_and_get_binary_operator_result_type(op, &left_type, &right_type) {
            Ok(ty) => Ok(ty),
            Err(reason) => {
                // builtin rules miss; a user defined overload may exist
                let override_name = operator_override_name(
                    OperatorDef::op_str(op),
                    &[left_type, right_type],
                );
                match self.pu().find_function(&override_name) {
                    Some(func) => Ok(func.return_type.clone()),
                    None => Err(TypeError::check("check binary expression", reason)),
                }
            }
        }
    }

    fn get_func_call_type(&mut self, func_name: &str, args: &[Expression]) -> TResult<Type> {
        let mut arg_types = vec![];
        for each in args {
            arg_types.push(self.get_expression_type(each)?);
        }

        // rule 1 : a visible identifier of function type is a callable object
        if let FindNameResult::Object(ty) = self.analyzer.find_name(func_name) {
            if let (Some(params), Some(ret)) = (ty.param_types(), ty.return_type()) {
                check_callable_signature(func_name, params, &arg_types)?;
                return Ok(ret.clone());
            }
        }

        // rule 2 : an implicit method call on the first argument
        if let Some(first) = arg_types.first() {
            if first.is_struct() {
                if let Some(method) = self.pu().find_type_method(&first.type_info(), func_name) {
                    let param_types =
                        method.params.iter().map(|p| p.ty.clone()).collect::<Vec<_>>();
                    check_callable_signature(func_name, &param_types, &arg_types[1..])?;
                    return Ok(method.return_type.clone());
                }
            }
        }

        // rule 3 : a free function or a registered host function
        if let Some(func) = self.pu().find_function(func_name) {
            let param_types = func.params.iter().map(|p| p.ty.clone()).collect::<Vec<_>>();
            check_callable_signature(func_name, &param_types, &arg_types)?;
            return Ok(func.return_type.clone());
        }
        if self.pu().host_functions().find(func_name) {
            return self
                .pu()
                .host_functions()
                .type_check(func_name, &arg_types)
                .map_err(|reason| TypeError::check("check host function call", reason));
        }

        Err(TypeError::check(
            "check call expression",
            format!("call to unknown name {func_name}"),
        ))
    }

    fn get_method_call_type(
        &mut self,
        id_name: &str,
        method_name: &str,
        args: &[Expression],
    ) -> TResult<Type> {
        let mut arg_types = vec![];
        for each in args {
            arg_types.push(self.get_expression_type(each)?);
        }
        let receiver_type = match self.analyzer.find_name(id_name) {
            FindNameResult::Object(ty) => ty,
            _ => {
                return Err(TypeError::check(
                    "check method call",
                    format!("undefined identifier {id_name}"),
                ))
            }
        };
        if is_inner_type(&receiver_type) {
            return InnerTypeMethod::instance()
                .type_check(&receiver_type, method_name, &arg_types)
                .map_err(|reason| TypeError::check("check inner method call", reason));
        }
        if !receiver_type.is_struct() {
            return Err(TypeError::check(
                "check method call",
                format!("{id_name} has non-struct type {receiver_type}"),
            ));
        }
        match self
            .pu()
            .find_type_method(&receiver_type.type_info(), method_name)
        {
            Some(method) => {
                let param_types = method.params.iter().map(|p| p.ty.clone()).collect::<Vec<_>>();
                check_callable_signature(method_name, &param_types, &arg_types)?;
                Ok(method.return_type.clone())
            }
            None => Err(TypeError::check(
                "check method call",
                format!("method {receiver_type}.{method_name} not exist"),
            )),
        }
    }

    // deterministic return

    fn check_deterministic_return_func(&self, func: &FunctionDef) -> TResult<()> {
        if func.return_type.is_void() {
            return Ok(());
        }
        if !is_deterministic_return(&func.block) {
            return Err(TypeError::DeterministicReturn {
                name: func.name.clone(),
            });
        }
        Ok(())
    }

    fn check_deterministic_return_method(
        &self,
        struct_name: &str,
        method: &MethodDef,
    ) -> TResult<()> {
        if method.return_type.is_void() {
            return Ok(());
        }
        let block = method.block.as_ref().expect("checked by caller");
        if !is_deterministic_return(block) {
            return Err(TypeError::DeterministicReturn {
                name: format!("{}.{}", struct_name, method.method_name),
            });
        }
        Ok(())
    }
}

/// A block terminates deterministically iff its last statement is a return,
/// an if with a non-empty else where both branches terminate, or a nested
/// block that terminates.
pub fn is_deterministic_return(block: &BlockStmt) -> bool {
    match block.stmts.last() {
        Some(Statement::Return(_)) => true,
        Some(Statement::If {
            if_block,
            else_block: Some(else_block),
            ..
        }) if !else_block.stmts.is_empty() => {
            is_deterministic_return(if_block) && is_deterministic_return(else_block)
        }
        Some(Statement::Block(inner)) => is_deterministic_return(inner),
        _ => false,
    }
}

fn check_callable_signature(name: &str, params: &[Type], args: &[Type]) -> TResult<()> {
    if params.len() != args.len() {
        return Err(TypeError::check(
            format!("check call {name}"),
            format!(
                "the number of parameters does not match : {} != {}",
                params.len(),
                args.len()
            ),
        ));
    }
    for (i, (param, arg)) in params.iter().zip(args.iter()).enumerate() {
        if !is_same_type(param, arg) {
            return Err(TypeError::check(
                format!("check call {name}"),
                format!("arg_{i}'s type dismatch {param} != {arg}"),
            ));
        }
    }
    Ok(())
}

// builtin binary operator rules

fn check_and_get_plus_result_type(lt: &Type, rt: &Type) -> Result<Type, String> {
    for each in ["string", "int", "double"] {
        if lt.type_info() == each && rt.type_info() == each {
            return Ok(lt.clone());
        }
    }
    Err(format!("invalid operand type for + : {lt} and {rt}"))
}

fn check_and_get_mmd_result_type(op: &Token, lt: &Type, rt: &Type) -> Result<Type, String> {
    for each in ["int", "double"] {
        if lt.type_info() == each && rt.type_info() == each {
            return Ok(lt.clone());
        }
    }
    Err(format!(
        "invalid operand type for {} : {} and {}",
        op.token_str(),
        lt,
        rt
    ))
}

fn check_and_get_relation_result_type(op: &Token, lt: &Type, rt: &Type) -> Result<Type, String> {
    for each in ["int", "double"] {
        if lt.type_info() == each && rt.type_info() == each {
            return Ok(Type::boolean());
        }
    }
    Err(format!(
        "invalid operand type for {} : {} and {}",
        op.token_str(),
        lt,
        rt
    ))
}

fn check_and_get_logical_result_type(op: &Token, lt: &Type, rt: &Type) -> Result<Type, String> {
    if lt.is_bool() && rt.is_bool() {
        return Ok(Type::boolean());
    }
    Err(format!(
        "invalid operand type for {} : {} and {}",
        op.token_str(),
        lt,
        rt
    ))
}

fn check_and_get_compare_result_type(lt: &Type, rt: &Type) -> Result<Type, String> {
    if is_same_type(lt, rt) {
        return Ok(Type::boolean());
    }
    Err(format!("invalid type for compare, {lt} and {rt}"))
}

fn check_and_get_assign_result_type(lt: &Type, rt: &Type) -> Result<Type, String> {
    if is_same_type(lt, rt) && !lt.is_void() {
        return Ok(lt.clone());
    }
    Err(format!("invalid type for assign, {lt} and {rt}"))
}

fn check_and_get_binary_operator_result_type(
    op: &Token,
    lt: &Type,
    rt: &Type,
) -> Result<Type, String> {
    match op {
        Token::Plus => check_and_get_plus_result_type(lt, rt),
        Token::Minus | Token::Multiply | Token::Divide => {
            check_and_get_mmd_result_type(op, lt, rt)
        }
        Token::Gt | Token::Lt | Token::Gte | Token::Lte => {
            check_and_get_relation_result_type(op, lt, rt)
        }
        Token::And | Token::Or => check_and_get_logical_result_type(op, lt, rt),
        Token::Compare => check_and_get_compare_result_type(lt, rt),
        Token::Assign => check_and_get_assign_result_type(lt, rt),
        _ => Err(format!("operator {} is not supported", op.token_str())),
    }
}

fn check_and_get_unary_operator_result_type(op: &Token, operand: Type) -> TResult<Type> {
    match op {
        Token::Minus => {
            if operand.is_int() || operand.is_double() {
                Ok(operand)
            } else {
                Err(TypeError::check(
                    "check unary expression",
                    format!("invalid operand type for unary minus, {operand}"),
                ))
            }
        }
        Token::Multiply => match operand.hold_type() {
            Some(inner) => Ok(inner.clone()),
            None => Err(TypeError::check(
                "check unary expression",
                format!("invalid operand type for deref, {operand}"),
            )),
        },
        Token::AddressOf => Ok(Type::pointer_to(operand)),
        Token::Not => {
            if operand.is_bool() {
                Ok(operand)
            } else {
                Err(TypeError::check(
                    "check unary expression",
                    format!("invalid operand type for not, {operand}"),
                ))
            }
        }
        _ => Err(TypeError::check(
            "check unary expression",
            format!("operator {} is not supported", op.token_str()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    fn block_of(stmts: Vec<Statement>) -> BlockStmt {
        BlockStmt { stmts }
    }

    #[test]
    fn test_deterministic_return_last_statement() {
        let block = block_of(vec![
            Statement::Expression(Expression::IntLiteral(1)),
            Statement::Return(None),
        ]);
        assert!(is_deterministic_return(&block));

        let block = block_of(vec![
            Statement::Return(None),
            Statement::Expression(Expression::IntLiteral(1)),
        ]);
        assert!(!is_deterministic_return(&block));
    }

    #[test]
    fn test_deterministic_return_if_else() {
        let both = Statement::If {
            check: Expression::BoolLiteral(true),
            if_block: block_of(vec![Statement::Return(None)]),
            else_block: Some(block_of(vec![Statement::Return(None)])),
        };
        assert!(is_deterministic_return(&block_of(vec![both])));

        let only_if = Statement::If {
            check: Expression::BoolLiteral(true),
            if_block: block_of(vec![Statement::Return(None)]),
            else_block: None,
        };
        assert!(!is_deterministic_return(&block_of(vec![only_if])));
    }

    #[test]
    fn test_deterministic_return_nested_block() {
        let nested = Statement::Block(block_of(vec![Statement::Return(None)]));
        assert!(is_deterministic_return(&block_of(vec![nested])));
    }

    #[test]
    fn test_binary_operator_rules() {
        assert!(check_and_get_plus_result_type(&Type::string(), &Type::string()).is_ok());
        assert!(check_and_get_plus_result_type(&Type::boolean(), &Type::boolean()).is_err());
        assert!(check_and_get_mmd_result_type(&Token::Divide, &Type::string(), &Type::string())
            .is_err());
        assert_eq!(
            check_and_get_relation_result_type(&Token::Lt, &Type::int(), &Type::int()).unwrap(),
            Type::boolean()
        );
        assert!(check_and_get_compare_result_type(&Type::int(), &Type::double()).is_err());
    }
}
