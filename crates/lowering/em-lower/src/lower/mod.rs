//! Tree to IR lowering

mod binary;
mod expr;
mod function;
mod static_type;
mod stmt;

use crate::error::LowerResult;
use crate::scope::Environment;
use crate::symbol::FunctionTable;
use crate::visibility::visibility_of;
use crate::{LowerOptions, LoweredUnit};
use em_ast::Block;
use em_intern::{Interner, Symbol};
use em_ir::{Builder, Constant, FunctionId, IrType, Module, Signature, Value};
use tracing::debug;

/// Entry function of the unit and whether its return type is settled
#[derive(Debug, Clone, Copy)]
struct EntryFunction {
    id: FunctionId,
    return_fixed: bool,
}

/// State of one lowering session
///
/// Owns the module under construction, the builder, the scope stack and the
/// function table. Nothing is shared between sessions.
#[derive(Debug)]
pub struct LoweringContext<'ast> {
    options: LowerOptions,
    interner: Interner,
    module: Module,
    builder: Builder,
    env: Environment<'ast>,
    functions: FunctionTable<'ast>,
    entry: Option<EntryFunction>,
}

impl<'ast> LoweringContext<'ast> {
    /// Fresh session producing an empty module named after the options
    #[must_use]
    pub fn new(options: LowerOptions) -> Self {
        let module = Module::new(options.module_name.clone());
        Self {
            options,
            interner: Interner::new(),
            module,
            builder: Builder::new(),
            env: Environment::new(),
            functions: FunctionTable::new(),
            entry: None,
        }
    }

    /// Session options
    #[must_use]
    pub fn options(&self) -> &LowerOptions {
        &self.options
    }

    /// Module built so far
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Scope stack
    #[must_use]
    pub fn environment(&self) -> &Environment<'ast> {
        &self.env
    }

    /// Functions declared so far
    #[must_use]
    pub fn functions(&self) -> &FunctionTable<'ast> {
        &self.functions
    }

    /// Names seen by this session
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    fn intern(&self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Run `lower` inside a fresh scope; the scope is popped whether or not
    /// `lower` succeeds
    pub fn with_scope<T>(&mut self, lower: impl FnOnce(&mut Self) -> LowerResult<T>) -> LowerResult<T> {
        self.env.push_scope();
        let result = lower(self);
        self.env.pop_scope();
        result
    }

    /// Lower `root` into the entry function and hand out the finished module
    ///
    /// # Errors
    /// Fails with the first error raised by any node of the tree
    pub fn lower_unit(mut self, root: &'ast Block) -> LowerResult<LoweredUnit> {
        let name = self.options.entry_name.clone();
        let linkage = visibility_of(&name).into();
        let entry = self
            .module
            .add_function(name, Signature::new(Vec::new(), IrType::Void, false), linkage)?;
        let block = self.module.function_mut(entry).append_block("entry");
        self.builder.position_at_end(entry, block);
        self.entry = Some(EntryFunction {
            id: entry,
            return_fixed: false,
        });

        let last = self.with_scope(|cx| cx.lower_block(root))?;
        self.finish_entry(last)?;

        debug!(
            module = self.module.name(),
            functions = self.functions.len(),
            "lowered unit"
        );
        Ok(LoweredUnit {
            module: self.module,
            entry,
        })
    }

    /// Settle the entry function's return type on its first explicit
    /// top-level `return`
    fn fix_entry_return(&mut self, function: FunctionId, ty: IrType) {
        if let Some(entry) = self.entry.as_mut()
            && entry.id == function
            && !entry.return_fixed
        {
            entry.return_fixed = true;
            self.module.function_mut(function).signature.ret = ty;
        }
    }

    /// Terminate the entry function with the value of the last top-level
    /// statement
    ///
    /// After an explicit top-level `return` the open block only holds dead
    /// code and is closed with `unreachable` instead.
    fn finish_entry(&mut self, last: Option<Value>) -> LowerResult<()> {
        let Some(entry) = self.entry else {
            return Ok(());
        };
        if self.builder.is_block_terminated(&self.module) {
            return Ok(());
        }
        if entry.return_fixed {
            self.builder.build_unreachable(&mut self.module)?;
            return Ok(());
        }

        let last_ty = match &last {
            Some(value) => self.builder.value_type(&self.module, value)?,
            None => IrType::Void,
        };
        self.fix_entry_return(entry.id, last_ty);
        let value = last.filter(|_| last_ty.is_first_class());
        self.builder.build_return(&mut self.module, value)?;
        Ok(())
    }

    /// `ret` for a body that ran off its end: nothing for procedures, the zero
    /// value of the return type otherwise
    fn build_implicit_return(&mut self, function: FunctionId) -> LowerResult<()> {
        let ret = self.module.function(function).signature.ret;
        let value = Constant::zero(ret).map(Value::Const);
        self.builder.build_return(&mut self.module, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::lower::LoweringContext;
    use crate::{FunctionState, LowerError, LowerOptions, LoweredUnit, lower_unit};
    use em_ast::{ArgumentList, BinaryOperator, Block, Expr, FunctionDeclaration, Stmt, VariableDeclaration};
    use em_ir::{BinaryOp, Constant, InstKind, IrType, Terminator, Value};
    use expect_test::expect;

    fn lower(statements: Vec<Stmt>) -> Result<LoweredUnit, LowerError> {
        lower_unit(&Block::new(statements), &LowerOptions::default())
    }

    fn int_param(name: &str) -> VariableDeclaration {
        VariableDeclaration::new(name, Some("int"))
    }

    fn add_function() -> Stmt {
        let body = Block::new(vec![Stmt::Return(Expr::binary(
            Expr::ident("a"),
            BinaryOperator::Plus,
            Expr::ident("b"),
        ))]);
        FunctionDeclaration::new(
            "add",
            ArgumentList::new(vec![int_param("a"), int_param("b")]),
            Some("int"),
            body,
        )
        .into()
    }

    fn binary_ops(unit: &LoweredUnit, name: &str) -> Vec<BinaryOp> {
        let id = unit.module.get_function(name).unwrap();
        unit.module
            .function(id)
            .instructions()
            .filter_map(|(_, inst)| match inst.kind {
                InstKind::Binary { op, .. } => Some(op),
                _ => None,
            })
            .collect()
    }

    fn entry_terminator(unit: &LoweredUnit) -> Option<Terminator> {
        let entry = unit.module.function(unit.entry);
        entry.blocks().last().and_then(|block| block.terminator)
    }

    #[test]
    fn test_integer_literal_becomes_entry_result() {
        for n in [42, 0, -1, i64::MIN, i64::MAX] {
            let unit = lower(vec![Stmt::Expression(Expr::int(n))]).unwrap();
            assert_eq!(unit.entry_type(), IrType::I64);
            assert_eq!(
                entry_terminator(&unit),
                Some(Terminator::Return(Some(Value::Const(Constant::Int(n))))),
                "literal {n}"
            );
        }
    }

    #[test]
    fn test_empty_unit_returns_void() {
        let unit = lower(Vec::new()).unwrap();
        assert_eq!(unit.entry_type(), IrType::Void);
        assert_eq!(entry_terminator(&unit), Some(Terminator::Return(None)));
    }

    #[test]
    fn test_top_level_return_fixes_entry_type() {
        let unit = lower(vec![
            Stmt::Return(Expr::float(1.5)),
            Stmt::Expression(Expr::binary(Expr::int(1), BinaryOperator::Plus, Expr::int(2))),
        ])
        .unwrap();
        assert_eq!(unit.entry_type(), IrType::F64);
        // The trailing sum lands in a dead block that never returns
        let entry = unit.module.function(unit.entry);
        assert_eq!(entry.return_count(), 1);
        assert_eq!(
            entry.blocks()[0].terminator,
            Some(Terminator::Return(Some(Value::float(1.5))))
        );
        assert_eq!(entry_terminator(&unit), Some(Terminator::Unreachable));
        assert!(em_ir::verify(&unit.module).is_empty());
    }

    #[test]
    fn test_integer_operands_use_integer_table() {
        let unit = lower(vec![
            VariableDeclaration::with_initializer("a", Some("int"), Expr::int(1)).into(),
            VariableDeclaration::with_initializer("b", Some("int"), Expr::int(2)).into(),
            Stmt::Expression(Expr::binary(Expr::ident("a"), BinaryOperator::Mul, Expr::ident("b"))),
        ])
        .unwrap();
        assert_eq!(binary_ops(&unit, "__main"), vec![BinaryOp::Mul]);
        assert_eq!(unit.entry_type(), IrType::I64);
    }

    #[test]
    fn test_float_operands_use_float_table() {
        let unit = lower(vec![Stmt::Expression(Expr::binary(
            Expr::float(1.0),
            BinaryOperator::Minus,
            Expr::float(0.5),
        ))])
        .unwrap();
        assert_eq!(binary_ops(&unit, "__main"), vec![BinaryOp::FSub]);
    }

    #[test]
    fn test_comparison_yields_i1() {
        let unit = lower(vec![Stmt::Expression(Expr::binary(
            Expr::float(1.0),
            BinaryOperator::Lt,
            Expr::float(2.0),
        ))])
        .unwrap();
        assert_eq!(unit.entry_type(), IrType::I1);
    }

    #[test]
    fn test_mixed_operands_are_a_type_mismatch() {
        let err = lower(vec![Stmt::Expression(Expr::binary(
            Expr::int(1),
            BinaryOperator::Plus,
            Expr::float(2.0),
        ))])
        .unwrap_err();
        assert!(matches!(
            err,
            LowerError::TypeMismatch {
                op: BinaryOperator::Plus,
                ..
            }
        ));
    }

    #[test]
    fn test_modulo_is_not_native() {
        let err = lower(vec![Stmt::Expression(Expr::binary(
            Expr::int(7),
            BinaryOperator::Mod,
            Expr::int(2),
        ))])
        .unwrap_err();
        assert_eq!(
            err,
            LowerError::UnsupportedOperator {
                op: BinaryOperator::Mod,
                ty: IrType::I64
            }
        );
    }

    #[test]
    fn test_assignment_to_parameter_is_rejected() {
        let body = Block::new(vec![Stmt::Expression(Expr::assign("a", Expr::int(1)))]);
        let err = lower(vec![
            FunctionDeclaration::new("f", ArgumentList::new(vec![int_param("a")]), None, body).into(),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            LowerError::UndeclaredVariable {
                name: "a".to_owned()
            }
        );
    }

    #[test]
    fn test_undeclared_identifier() {
        let err = lower(vec![Stmt::Expression(Expr::ident("ghost"))]).unwrap_err();
        assert_eq!(
            err,
            LowerError::UndeclaredVariable {
                name: "ghost".to_owned()
            }
        );
    }

    #[test]
    fn test_body_without_return_gets_one_synthesized_return() {
        let body = Block::new(vec![VariableDeclaration::with_initializer("x", Some("int"), Expr::int(1)).into()]);
        let unit = lower(vec![
            FunctionDeclaration::new("f", ArgumentList::default(), Some("int"), body).into(),
        ])
        .unwrap();
        let f = unit.module.function(unit.module.get_function("f").unwrap());
        assert_eq!(f.return_count(), 1);
        assert_eq!(
            f.blocks()[0].terminator,
            Some(Terminator::Return(Some(Value::int(0))))
        );
    }

    #[test]
    fn test_body_with_return_gets_no_second_terminator() {
        let unit = lower(vec![add_function()]).unwrap();
        let add = unit.module.function(unit.module.get_function("add").unwrap());
        assert_eq!(add.blocks().len(), 1);
        assert_eq!(add.return_count(), 1);
        assert_eq!(binary_ops(&unit, "add"), vec![BinaryOp::Add]);
    }

    #[test]
    fn test_code_after_return_gets_no_second_return() {
        // function f(): int { return 1; var y: int = 2; }
        let body = Block::new(vec![
            Stmt::Return(Expr::int(1)),
            VariableDeclaration::with_initializer("y", Some("int"), Expr::int(2)).into(),
        ]);
        let unit = lower(vec![
            FunctionDeclaration::new("f", ArgumentList::default(), Some("int"), body).into(),
        ])
        .unwrap();

        let f = unit.module.function(unit.module.get_function("f").unwrap());
        assert_eq!(f.return_count(), 1);
        assert_eq!(f.blocks().len(), 2);
        assert_eq!(f.blocks()[1].terminator, Some(Terminator::Unreachable));
        assert!(em_ir::verify(&unit.module).is_empty());

        expect![[r#"
            ; ModuleID = 'unit'

            define internal void @__main() {
            entry:
              ret void
            }

            define i64 @f() {
            entry:
              ret i64 1
            bb1:
              %y.0 = alloca i64
              store i64 2, ptr %y.0
              unreachable
            }
        "#]]
        .assert_eq(&unit.module.to_string());
    }

    #[test]
    fn test_explicit_return_terminates_function() {
        let decl = FunctionDeclaration::new(
            "one",
            ArgumentList::default(),
            Some("int"),
            Block::new(vec![Stmt::Return(Expr::int(1))]),
        );
        let mut cx = LoweringContext::new(LowerOptions::default());
        cx.lower_function(&decl).unwrap();

        let symbol = cx.interner().get("one").unwrap();
        assert_eq!(cx.functions().get(symbol).unwrap().state, FunctionState::Terminated);
    }

    #[test]
    fn test_failed_body_leaves_no_scope_behind() {
        let decl = FunctionDeclaration::new(
            "f",
            ArgumentList::new(vec![int_param("a")]),
            None,
            Block::new(vec![Stmt::Expression(Expr::ident("ghost"))]),
        );
        let mut cx = LoweringContext::new(LowerOptions::default());
        let err = cx.lower_function(&decl).unwrap_err();

        assert_eq!(
            err,
            LowerError::UndeclaredVariable {
                name: "ghost".to_owned()
            }
        );
        assert_eq!(cx.environment().depth(), 0);
    }

    #[test]
    fn test_overload_is_called_with_operands_in_order() {
        let operator = FunctionDeclaration::external(
            "operator_PLUS",
            ArgumentList::new(vec![
                VariableDeclaration::new("x", Some("vec")),
                VariableDeclaration::new("y", Some("vec")),
            ]),
            Some("vec"),
        );
        let body = Block::new(vec![Stmt::Return(Expr::binary(
            Expr::ident("a"),
            BinaryOperator::Plus,
            Expr::ident("b"),
        ))]);
        let sum = FunctionDeclaration::new(
            "sum",
            ArgumentList::new(vec![
                VariableDeclaration::new("a", Some("vec")),
                VariableDeclaration::new("b", Some("vec")),
            ]),
            Some("vec"),
            body,
        );
        let unit = lower(vec![operator.into(), sum.into()]).unwrap();

        let operator = unit.module.get_function("operator_PLUS").unwrap();
        let sum = unit.module.function(unit.module.get_function("sum").unwrap());
        let calls: Vec<_> = sum
            .instructions()
            .filter_map(|(_, inst)| match &inst.kind {
                InstKind::Call { callee, args } => Some((*callee, args.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(calls, vec![(operator, vec![Value::Param(0), Value::Param(1)])]);
    }

    #[test]
    fn test_missing_overload() {
        let body = Block::new(vec![Stmt::Expression(Expr::binary(
            Expr::ident("a"),
            BinaryOperator::Ge,
            Expr::ident("b"),
        ))]);
        let f = FunctionDeclaration::new(
            "f",
            ArgumentList::new(vec![VariableDeclaration::new("a", None), VariableDeclaration::new("b", None)]),
            None,
            body,
        );
        let err = lower(vec![f.into()]).unwrap_err();
        assert_eq!(
            err,
            LowerError::OverloadNotFound {
                op: BinaryOperator::Ge,
                name: "operator_GE".to_owned()
            }
        );
    }

    #[test]
    fn test_string_literals_fold() {
        let unit = lower(vec![Stmt::Expression(Expr::binary(
            Expr::string("ab"),
            BinaryOperator::Plus,
            Expr::string("c"),
        ))])
        .unwrap();
        assert!(unit.module.get_function("concat").is_none());
        let folded: Vec<_> = unit
            .module
            .globals()
            .map(|(_, global)| global.value.clone())
            .collect();
        assert_eq!(folded, vec!["abc".to_owned()]);
    }

    #[test]
    fn test_string_variable_concatenation_calls_runtime() {
        let unit = lower(vec![
            VariableDeclaration::with_initializer("s", Some("string"), Expr::string("ab")).into(),
            Stmt::Expression(Expr::assign(
                "s",
                Expr::binary(Expr::ident("s"), BinaryOperator::Plus, Expr::string("c")),
            )),
        ])
        .unwrap();

        expect![[r#"
            ; ModuleID = 'unit'

            @.str.0 = private constant [3 x i8] c"ab\00"
            @.str.1 = private constant [2 x i8] c"c\00"

            define internal ptr @__main() {
            entry:
              %s.0 = alloca ptr
              store ptr @.str.0, ptr %s.0
              %s.2 = load ptr, ptr %s.0
              %3 = call ptr @concat(ptr %s.2, ptr @.str.1)
              store ptr %3, ptr %s.0
              ret ptr %3
            }

            declare ptr @concat(ptr, ptr)
        "#]]
        .assert_eq(&unit.module.to_string());
    }

    #[test]
    fn test_add_scenario_snapshot() {
        let unit = lower(vec![
            add_function(),
            Stmt::Expression(Expr::call("add", vec![Expr::int(2), Expr::int(3)])),
        ])
        .unwrap();

        expect![[r#"
            ; ModuleID = 'unit'

            define internal i64 @__main() {
            entry:
              %0 = call i64 @add(i64 2, i64 3)
              ret i64 %0
            }

            define i64 @add(i64 %a, i64 %b) {
            entry:
              %0 = add i64 %a, %b
              ret i64 %0
            }
        "#]]
        .assert_eq(&unit.module.to_string());
    }

    #[test]
    fn test_call_arity_is_checked() {
        let err = lower(vec![
            add_function(),
            Stmt::Expression(Expr::call("add", vec![Expr::int(2)])),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            LowerError::ArgumentCountMismatch {
                name: "add".to_owned(),
                expected: 2,
                found: 1,
                variadic: false
            }
        );
    }

    #[test]
    fn test_variadic_call_accepts_extra_arguments() {
        let printf = FunctionDeclaration::external(
            "printf",
            ArgumentList::variadic(vec![VariableDeclaration::new("format", Some("string"))]),
            Some("int"),
        );
        let unit = lower(vec![
            printf.into(),
            Stmt::Expression(Expr::call("printf", vec![Expr::string("%d"), Expr::int(1)])),
        ])
        .unwrap();
        assert_eq!(unit.entry_type(), IrType::I64);
    }

    #[test]
    fn test_undeclared_function() {
        let err = lower(vec![Stmt::Expression(Expr::call("missing", Vec::new()))]).unwrap_err();
        assert_eq!(
            err,
            LowerError::UndeclaredFunction {
                name: "missing".to_owned()
            }
        );
    }

    #[test]
    fn test_forward_declaration_then_body() {
        let forward = FunctionDeclaration::external(
            "add",
            ArgumentList::new(vec![int_param("a"), int_param("b")]),
            Some("int"),
        );
        let unit = lower(vec![forward.into(), add_function()]).unwrap();
        let add = unit.module.function(unit.module.get_function("add").unwrap());
        assert!(!add.is_declaration());
    }

    #[test]
    fn test_second_body_is_a_redefinition() {
        let err = lower(vec![add_function(), add_function()]).unwrap_err();
        assert_eq!(
            err,
            LowerError::FunctionRedefinition {
                name: "add".to_owned()
            }
        );
    }

    #[test]
    fn test_untyped_local_takes_initializer_type() {
        let unit = lower(vec![
            VariableDeclaration::with_initializer("x", None, Expr::float(2.0)).into(),
            Stmt::Expression(Expr::binary(Expr::ident("x"), BinaryOperator::Plus, Expr::float(1.0))),
        ])
        .unwrap();
        assert_eq!(binary_ops(&unit, "__main"), vec![BinaryOp::FAdd]);
    }

    #[test]
    fn test_address_of_local_is_its_storage() {
        let unit = lower(vec![
            VariableDeclaration::new("x", Some("int")).into(),
            Stmt::Expression(Expr::address_of("x")),
        ])
        .unwrap();
        assert_eq!(unit.entry_type(), IrType::Ptr);
        let entry = unit.module.function(unit.entry);
        let Some(Terminator::Return(Some(Value::Inst(slot)))) = entry.blocks()[0].terminator else {
            panic!("entry should return the slot");
        };
        assert!(matches!(entry.instruction(slot).kind, InstKind::Alloca { allocated: IrType::I64 }));
    }
}
