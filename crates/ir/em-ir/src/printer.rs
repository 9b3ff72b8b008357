//! Textual form of a module, close to LLVM assembly

use crate::module::{Function, InstId, InstKind, Module, Terminator};
use crate::value::{Constant, Value};
use std::fmt::{self, Write};

impl fmt::Display for Module {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "; ModuleID = '{}'", self.name())?;

        let mut globals = self.globals().peekable();
        if globals.peek().is_some() {
            writeln!(formatter)?;
        }
        for (_, global) in globals {
            writeln!(
                formatter,
                "@{} = private constant [{} x i8] c\"{}\\00\"",
                global.name,
                global.value.len() + 1,
                escape(&global.value)
            )?;
        }

        for (_, function) in self.functions() {
            writeln!(formatter)?;
            FunctionPrinter {
                module: self,
                function,
            }
            .print(formatter)?;
        }
        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte == b' ' || (byte.is_ascii_graphic() && byte != b'"' && byte != b'\\') {
            escaped.push(char::from(byte));
        } else {
            #[allow(clippy::let_underscore_must_use, reason = "Writing to a String cannot fail")]
            let _ = write!(escaped, "\\{byte:02X}");
        }
    }
    escaped
}

struct FunctionPrinter<'a> {
    module: &'a Module,
    function: &'a Function,
}

impl FunctionPrinter<'_> {
    fn print(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = self.function;
        let signature = &function.signature;

        if function.is_declaration() {
            let mut params: Vec<String> = signature.params.iter().map(ToString::to_string).collect();
            if signature.variadic {
                params.push("...".to_owned());
            }
            return writeln!(
                formatter,
                "declare {} @{}({})",
                signature.ret,
                function.name,
                params.join(", ")
            );
        }

        let mut params: Vec<String> = signature
            .params
            .iter()
            .zip(0_u32..)
            .map(|(ty, index)| format!("{ty} %{}", function.param_name(index)))
            .collect();
        if signature.variadic {
            params.push("...".to_owned());
        }
        let linkage = match function.linkage {
            crate::Linkage::Internal => "internal ",
            crate::Linkage::External => "",
        };
        writeln!(
            formatter,
            "define {linkage}{} @{}({}) {{",
            signature.ret,
            function.name,
            params.join(", ")
        )?;

        for block in function.blocks() {
            writeln!(formatter, "{}:", block.label)?;
            for &id in &block.instructions {
                writeln!(formatter, "  {}", self.instruction(id))?;
            }
            match &block.terminator {
                Some(Terminator::Return(Some(value))) => {
                    writeln!(formatter, "  ret {} {}", function.value_type(value), self.operand(value))?;
                }
                Some(Terminator::Return(None)) => writeln!(formatter, "  ret void")?,
                Some(Terminator::Unreachable) => writeln!(formatter, "  unreachable")?,
                None => {}
            }
        }
        writeln!(formatter, "}}")
    }

    fn result(&self, id: InstId) -> String {
        let index = u32::from(id.into_raw());
        match &self.function.instruction(id).name {
            Some(name) => format!("%{name}.{index}"),
            None => format!("%{index}"),
        }
    }

    fn operand(&self, value: &Value) -> String {
        match value {
            Value::Const(Constant::Int(value)) => value.to_string(),
            Value::Const(Constant::Float(value)) => format!("{value:?}"),
            Value::Const(Constant::Bool(value)) => value.to_string(),
            Value::Const(Constant::Null) => "null".to_owned(),
            Value::Param(index) => format!("%{}", self.function.param_name(*index)),
            Value::Inst(id) => self.result(*id),
            Value::Global(id) => format!("@{}", self.module.global(*id).name),
        }
    }

    fn typed(&self, value: &Value) -> String {
        format!("{} {}", self.function.value_type(value), self.operand(value))
    }

    fn instruction(&self, id: InstId) -> String {
        let instruction = self.function.instruction(id);
        let result = self.result(id);
        match &instruction.kind {
            InstKind::Alloca { allocated } => format!("{result} = alloca {allocated}"),
            InstKind::Load { ptr } => {
                format!("{result} = load {}, {}", instruction.ty, self.typed(ptr))
            }
            InstKind::Store { value, ptr } => {
                format!("store {}, {}", self.typed(value), self.typed(ptr))
            }
            InstKind::Binary { op, lhs, rhs } => format!(
                "{result} = {} {}, {}",
                op.mnemonic(),
                self.typed(lhs),
                self.operand(rhs)
            ),
            InstKind::ICmp { pred, lhs, rhs } => format!(
                "{result} = icmp {} {}, {}",
                pred.mnemonic(),
                self.typed(lhs),
                self.operand(rhs)
            ),
            InstKind::FCmp { pred, lhs, rhs } => format!(
                "{result} = fcmp {} {}, {}",
                pred.mnemonic(),
                self.typed(lhs),
                self.operand(rhs)
            ),
            InstKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|arg| self.typed(arg)).collect();
                let call = format!(
                    "call {} @{}({})",
                    instruction.ty,
                    self.module.function(*callee).name,
                    args.join(", ")
                );
                if instruction.ty.is_first_class() {
                    format!("{result} = {call}")
                } else {
                    call
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{BinaryOp, Builder, IrType, Linkage, Module, Signature, Value};
    use expect_test::expect;

    #[test]
    fn test_print_function_with_globals() {
        let mut module = Module::new("unit");
        let puts = module
            .add_function("puts", Signature::new(vec![IrType::Ptr], IrType::I64, true), Linkage::External)
            .unwrap();
        let add = module
            .add_function(
                "add",
                Signature::new(vec![IrType::I64, IrType::I64], IrType::I64, false),
                Linkage::External,
            )
            .unwrap();
        module.function_mut(add).param_names = vec![Some("a".to_owned()), Some("b".to_owned())];
        let entry = module.function_mut(add).append_block("entry");

        let mut builder = Builder::new();
        builder.position_at_end(add, entry);
        let hello = module.add_global_string("hi \"there\"\n");
        builder
            .build_call(&mut module, puts, &[Value::Global(hello)], "")
            .unwrap();
        let slot = builder.build_alloca(&mut module, IrType::I64, "sum").unwrap();
        let sum = builder
            .build_int_binop(&mut module, BinaryOp::Add, Value::Param(0), Value::Param(1), "")
            .unwrap();
        builder.build_store(&mut module, sum, slot).unwrap();
        let loaded = builder.build_load(&mut module, IrType::I64, slot, "").unwrap();
        builder.build_return(&mut module, Some(loaded)).unwrap();

        expect![[r#"
            ; ModuleID = 'unit'

            @.str.0 = private constant [12 x i8] c"hi \22there\22\0A\00"

            declare i64 @puts(ptr, ...)

            define i64 @add(i64 %a, i64 %b) {
            entry:
              %0 = call i64 @puts(ptr @.str.0)
              %sum.1 = alloca i64
              %2 = add i64 %a, %b
              store i64 %2, ptr %sum.1
              %4 = load i64, ptr %sum.1
              ret i64 %4
            }
        "#]]
        .assert_eq(&module.to_string());
    }

    #[test]
    fn test_print_internal_void_function() {
        let mut module = Module::new("unit");
        let main = module
            .add_function("__main", Signature::new(vec![], IrType::Void, false), Linkage::Internal)
            .unwrap();
        let entry = module.function_mut(main).append_block("entry");
        let mut builder = Builder::new();
        builder.position_at_end(main, entry);
        builder.build_return(&mut module, None).unwrap();

        expect![[r#"
            ; ModuleID = 'unit'

            define internal void @__main() {
            entry:
              ret void
            }
        "#]]
        .assert_eq(&module.to_string());
    }
}
