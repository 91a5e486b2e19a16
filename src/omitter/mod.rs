//! The lowering core: MIR → target-IR block graph. Matches
//! `original_source/omitter/omit.go`'s wiring of `procedures_definition` /
//! `procedures_prototype`, the `_Stack` frame prologue/epilogue, and
//! identity-table UUID reuse.

pub mod expression;
pub mod statement;

use serde_json;
use uuid::Uuid;

use crate::archive::Archive;
use crate::mir;
use crate::target_ir::idtable::IdUsage;
use crate::target_ir::{Block, Field, Mutation};

/// Default bound on a function's `_Stack` frame, overridable via
/// configuration (`max_stack_size`).
pub const DEFAULT_MAX_STACK_SIZE: u32 = 1000;

#[derive(Debug)]
pub enum OmitError {
    DerefDynSized,
    AssignDynSized,
    SlotCountMismatch,
    ArityMismatch,
    StackOverflow { size: u32, max: u32 },
    NotImplemented,
}

impl std::fmt::Display for OmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OmitError::DerefDynSized => write!(f, "cannot deref a dyn-sized value"),
            OmitError::AssignDynSized => write!(f, "cannot assign to a dyn-sized array"),
            OmitError::SlotCountMismatch => write!(f, "type not fit"),
            OmitError::ArityMismatch => write!(f, "arguments mismatched"),
            OmitError::StackOverflow { size, max } => {
                write!(f, "stack frame of size {} exceeds max {}", size, max)
            }
            OmitError::NotImplemented => write!(f, "not implemented yet"),
        }
    }
}

impl std::error::Error for OmitError {}

pub struct Omitter<'a, 'p> {
    pub(crate) archive: &'p mut Archive,
    pub(crate) program: &'a mir::Program<'a>,
    pub(crate) stack_uuid: String,
    pub(crate) omitting_function: Option<&'a mir::FunctionDeclaration<'a>>,
    pub(crate) max_stack_size: u32,
}

impl<'a, 'p> Omitter<'a, 'p> {
    pub fn new(archive: &'p mut Archive, program: &'a mir::Program<'a>) -> Self {
        Omitter {
            archive,
            program,
            stack_uuid: String::new(),
            omitting_function: None,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
        }
    }

    pub fn with_max_stack_size(mut self, max_stack_size: u32) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    pub fn set_target(&mut self, name: &str) {
        self.archive.set_editing_target(name);
        self.stack_uuid = self.archive.ensure_stack_list();
    }

    pub fn omit(&mut self) -> Result<(), OmitError> {
        for declaration in &self.program.declarations {
            self.omit_declaration(declaration)?;
        }
        Ok(())
    }

    fn omit_declaration(&mut self, declaration: &mir::Declaration<'a>) -> Result<(), OmitError> {
        match declaration {
            mir::Declaration::Global(_) => Ok(()),
            mir::Declaration::Function(ptr) => {
                let function = self.program.function(*ptr);
                self.omit_function(function)
            }
        }
    }

    fn omit_function(&mut self, function: &'a mir::FunctionDeclaration<'a>) -> Result<(), OmitError> {
        if function.stack_size > self.max_stack_size {
            return Err(OmitError::StackOverflow {
                size: function.stack_size,
                max: self.max_stack_size,
            });
        }

        let mut head = Block::new("procedures_definition");
        head.top_level = true;
        let head_uuid = self.archive.insert_block(head);

        let warp_string = function.warp.to_string();
        let mut prototype = Block::new("procedures_prototype");
        prototype.shadow = true;
        prototype.mutation = Some(Mutation {
            tag_name: "mutation".to_string(),
            children: Vec::new(),
            proc_code: Some(function.proc_code.clone()),
            argument_ids: Some(function.argument_ids.clone()),
            warp: Some(warp_string),
            argument_names: None,
            argument_defaults: None,
            has_next: None,
        });

        let reused = self.archive.id_table.lookup(&function.proc_code).cloned();
        let prototype_uuid = match reused {
            Some(usage) => usage.uuid,
            None => {
                let uuid = Uuid::new_v4().to_string();
                self.archive.id_table.update(
                    function.proc_code.clone(),
                    IdUsage {
                        for_name: function.name.clone(),
                        uuid: uuid.clone(),
                        raw_declaration: function.span.string().to_string(),
                    },
                );
                uuid
            }
        };
        self.archive
            .insert_block_with_uuid(prototype_uuid.clone(), prototype);
        self.archive
            .set_shadow_input(&head_uuid, "custom_block", &prototype_uuid);

        let mut argument_names = Vec::new();
        let mut argument_defaults = Vec::new();
        for argument in &function.arguments {
            for slot in &argument.type_view.slots {
                let arg_name = format!("({}){}", argument.name, slot.index);
                let mut arg_block = Block::new("argument_reporter_string_number");
                arg_block.shadow = true;
                arg_block
                    .fields
                    .insert("VALUE".to_string(), Field { value: arg_name.clone(), id: None });
                let arg_uuid = self.archive.insert_block(arg_block);
                self.archive
                    .set_shadow_input(&prototype_uuid, &slot.uuid, &arg_uuid);
                argument_names.push(arg_name);
                argument_defaults.push(String::new());
            }
        }
        let argument_names_json = serde_json::to_string(&argument_names).unwrap();
        let argument_defaults_json = serde_json::to_string(&argument_defaults).unwrap();
        if let Some(mutation) = self.archive.block_mut(&prototype_uuid).mutation.as_mut() {
            mutation.argument_names = Some(argument_names_json);
            mutation.argument_defaults = Some(argument_defaults_json);
        }

        self.omitting_function = Some(function);
        let body_uuids = self.omit_block(&function.body);
        self.omitting_function = None;
        let body_uuids = body_uuids?;

        let mut chain = vec![head_uuid];
        for _ in 0..function.stack_size {
            chain.push(self.push_stack_frame_slot());
        }
        chain.extend(body_uuids);
        for _ in 0..function.stack_size {
            chain.push(self.pop_stack_frame_slot());
        }
        for pair in chain.windows(2) {
            self.archive.connect_blocks(&pair[0], &pair[1]);
        }

        Ok(())
    }

    fn push_stack_frame_slot(&mut self) -> String {
        let mut block = Block::new("data_addtolist");
        block.fields.insert(
            "LIST".to_string(),
            Field {
                value: "_Stack".to_string(),
                id: Some(self.stack_uuid.clone()),
            },
        );
        block.inputs.insert(
            "ITEM".to_string(),
            crate::target_ir::MaybeShadowedInput::Shadow(crate::target_ir::Input::Text {
                kind: crate::target_ir::InputKind::Str,
                value: String::new(),
            }),
        );
        self.archive.insert_block(block)
    }

    fn pop_stack_frame_slot(&mut self) -> String {
        let mut block = Block::new("data_deleteoflist");
        block.fields.insert(
            "LIST".to_string(),
            Field {
                value: "_Stack".to_string(),
                id: Some(self.stack_uuid.clone()),
            },
        );
        block.inputs.insert(
            "INDEX".to_string(),
            crate::target_ir::MaybeShadowedInput::Shadow(crate::target_ir::Input::Text {
                kind: crate::target_ir::InputKind::Str,
                value: "last".to_string(),
            }),
        );
        self.archive.insert_block(block)
    }

    fn omit_block(&mut self, block: &mir::Block<'a>) -> Result<Vec<String>, OmitError> {
        let mut block_uuids = Vec::new();
        for statement in &block.statements {
            block_uuids.extend(self.omit_statement(statement)?);
        }
        for pair in block_uuids.windows(2) {
            self.archive.connect_blocks(&pair[0], &pair[1]);
        }
        Ok(block_uuids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mir::slot::SlotAllocator;
    use crate::mir::{Accessor, Argument, Expression, FunctionDeclaration, Literal, Statement, Type, TypeView};
    use crate::span::{Position, SourceFile, Span};
    use crate::target_ir::{new_target, Meta, Project};
    use std::collections::HashMap;

    fn archive() -> Archive {
        let mut stage = new_target("Stage".to_string(), Vec::new());
        stage.is_stage = true;
        let project = Project {
            targets: vec![stage],
            monitors: Vec::new(),
            extensions: Vec::new(),
            meta: Meta {
                semver: "3.0.0".to_string(),
                vm: "0.2.0".to_string(),
                agent: "yumc".to_string(),
            },
        };
        let mut archive = Archive {
            assets: HashMap::new(),
            project,
            id_table: crate::target_ir::idtable::IdTable::new(),
            editing_target: None,
            stage_target: 0,
        };
        archive.set_editing_target("Stage");
        archive
    }

    fn zero_span(file: &'static SourceFile) -> Span<'static> {
        let zero = Position { index: 0, line_index: 0, lineno: 0 };
        Span { from: zero, to: zero, file }
    }

    fn leaked_source() -> &'static SourceFile {
        Box::leak(Box::new(SourceFile::new("t.yumc".to_string(), "x".to_string())))
    }

    fn blocks(archive: &Archive) -> &HashMap<String, Block> {
        &archive.project.targets[archive.editing_target.unwrap()].blocks
    }

    // S1: empty function.
    #[test]
    fn empty_function_chains_definition_push_and_pop() {
        let source = leaked_source();
        let span = zero_span(source);
        let mut program = mir::Program::new();
        let mut allocator = SlotAllocator::new();
        program.declare_function(FunctionDeclaration {
            name: "Hello".to_string(),
            arguments: Vec::new(),
            return_type_view: TypeView { typ: Type::String, slots: allocator.alloc_n(1), offset: 0 },
            body: mir::Block { statements: Vec::new(), span },
            proc_code: "Hello".to_string(),
            argument_ids: "[]".to_string(),
            warp: false,
            stack_size: 1,
            span,
        });
        let program = Box::leak(Box::new(program));

        let mut archive = archive();
        let mut omitter = Omitter::new(&mut archive, program);
        omitter.set_target("Stage");
        omitter.omit().unwrap();

        let target_blocks = blocks(&archive);
        let head = target_blocks
            .values()
            .find(|block| block.opcode == "procedures_definition")
            .unwrap();
        assert!(head.top_level);
        let push_uuid = head.next.clone().unwrap();
        let push = &target_blocks[&push_uuid];
        assert_eq!(push.opcode, "data_addtolist");
        let pop_uuid = push.next.clone().unwrap();
        let pop = &target_blocks[&pop_uuid];
        assert_eq!(pop.opcode, "data_deleteoflist");
        assert!(pop.next.is_none());

        let prototype_uuid = match head.inputs.get("custom_block").unwrap() {
            crate::target_ir::MaybeShadowedInput::Shadow(crate::target_ir::Input::Block(uuid)) => uuid.clone(),
            _ => panic!("custom_block should be a shadow block input"),
        };
        assert_eq!(target_blocks[&prototype_uuid].opcode, "procedures_prototype");
    }

    // S2: assigning a two-slot value indexes each destination slot in order.
    #[test]
    fn two_slot_assign_indexes_each_slot_with_distinct_offsets() {
        let source = leaked_source();
        let span = zero_span(source);
        let mut allocator = SlotAllocator::new();
        let program: mir::Program<'static> = mir::Program::new();
        let program = Box::leak(Box::new(program));

        let mut archive = archive();
        let mut omitter = Omitter::new(&mut archive, program);
        omitter.set_target("Stage");

        let dest = Accessor::Variable {
            type_view: TypeView {
                typ: Type::Array { inner: Box::new(Type::Number), n: 2 },
                slots: allocator.alloc_n(2),
                offset: 0,
            },
            span,
        };
        let source_value = Expression::Accessor(Box::new(Accessor::Variable {
            type_view: TypeView {
                typ: Type::Array { inner: Box::new(Type::Number), n: 2 },
                slots: allocator.alloc_n(2),
                offset: 5,
            },
            span,
        }));
        let statement = Statement::Assign { accessor: dest, value: source_value, span };
        let uuids = omitter.omit_statement(&statement).unwrap();
        assert_eq!(uuids.len(), 2);

        let target_blocks = blocks(&archive);
        let mut offsets = Vec::new();
        for uuid in &uuids {
            let replace = &target_blocks[uuid];
            assert_eq!(replace.opcode, "data_replaceitemoflist");
            let index_uuid = match replace.inputs.get("INDEX").unwrap() {
                crate::target_ir::MaybeShadowedInput::Nonshadow(crate::target_ir::Input::Block(uuid)) => uuid,
                _ => panic!("INDEX should be a nonshadow block input"),
            };
            let subtract = &target_blocks[index_uuid];
            assert_eq!(subtract.opcode, "operator_subtract");
            match subtract.inputs.get("NUM2").unwrap() {
                crate::target_ir::MaybeShadowedInput::Shadow(crate::target_ir::Input::Numeral { value, .. }) => {
                    offsets.push(*value);
                }
                _ => panic!("NUM2 should be a shadow numeral"),
            }
        }
        assert_eq!(offsets, vec![0.0, 1.0]);
    }

    // S3: return by value.
    #[test]
    fn return_by_value_wires_join_into_set_variable() {
        let source = leaked_source();
        let span = zero_span(source);
        let mut allocator = SlotAllocator::new();
        let program: mir::Program<'static> = mir::Program::new();
        let program = Box::leak(Box::new(program));

        let mut archive = archive();
        let mut omitter = Omitter::new(&mut archive, program);
        omitter.set_target("Stage");

        let return_type_view = TypeView { typ: Type::String, slots: allocator.alloc_n(1), offset: 0 };
        let function = FunctionDeclaration {
            name: "Hello".to_string(),
            arguments: Vec::new(),
            return_type_view: return_type_view.clone(),
            body: mir::Block { statements: Vec::new(), span },
            proc_code: "Hello".to_string(),
            argument_ids: "[]".to_string(),
            warp: false,
            stack_size: 0,
            span,
        };
        let function: &'static FunctionDeclaration<'static> = Box::leak(Box::new(function));

        omitter.omitting_function = Some(function);
        let statement = Statement::Return {
            value: Expression::Literal(Literal::String("X".to_string())),
            span,
        };
        let uuids = omitter.omit_statement(&statement).unwrap();
        omitter.omitting_function = None;
        assert_eq!(uuids.len(), 1);

        let target_blocks = blocks(&archive);
        let set_var = &target_blocks[&uuids[0]];
        assert_eq!(set_var.opcode, "data_setvariableto");
        assert_eq!(set_var.fields["VARIABLE"].value, return_type_view.slots[0].uuid);
        let value_uuid = match set_var.inputs.get("VALUE").unwrap() {
            crate::target_ir::MaybeShadowedInput::Nonshadow(crate::target_ir::Input::Block(uuid)) => uuid,
            _ => panic!("VALUE should be a nonshadow block input"),
        };
        let join = &target_blocks[value_uuid];
        assert_eq!(join.opcode, "operator_join");
    }

    // S4: self-recursive call reuses its identity-table UUID and wires
    // exactly one procedures_call input per argument slot.
    #[test]
    fn self_recursive_call_reuses_prototype_uuid_and_wires_argument_slots() {
        let source = leaked_source();
        let span = zero_span(source);
        let mut allocator = SlotAllocator::new();
        let mut program = mir::Program::new();

        let argument_type_view = TypeView {
            typ: Type::Array { inner: Box::new(Type::String), n: 2 },
            slots: allocator.alloc_n(2),
            offset: 0,
        };
        let return_type_view = argument_type_view.clone();
        let ptr = program.declare_function(FunctionDeclaration {
            name: "Hello".to_string(),
            arguments: vec![Argument { name: "world".to_string(), type_view: argument_type_view, span }],
            return_type_view,
            body: mir::Block { statements: Vec::new(), span },
            proc_code: "Hello".to_string(),
            argument_ids: "[]".to_string(),
            warp: false,
            stack_size: 0,
            span,
        });
        {
            let function = program.functions.get_mut(&ptr);
            let argument_accessor = Accessor::Variable { type_view: function.arguments[0].type_view.clone(), span };
            function.body.statements.push(Statement::Assign {
                accessor: Accessor::Variable { type_view: function.return_type_view.clone(), span },
                value: Expression::Call { function: ptr, arguments: vec![Expression::Accessor(Box::new(argument_accessor))] },
                span,
            });
        }
        let program = Box::leak(Box::new(program));

        let mut archive = archive();
        let mut omitter = Omitter::new(&mut archive, program);
        omitter.set_target("Stage");
        omitter.omit().unwrap();
        let first_uuid = archive.id_table.lookup("Hello").unwrap().uuid.clone();

        let mut omitter = Omitter::new(&mut archive, program);
        omitter.set_target("Stage");
        omitter.omit().unwrap();
        let second_uuid = archive.id_table.lookup("Hello").unwrap().uuid.clone();
        assert_eq!(first_uuid, second_uuid);

        let target_blocks = blocks(&archive);
        let call_blocks: Vec<_> = target_blocks.values().filter(|block| block.opcode == "procedures_call").collect();
        assert!(!call_blocks.is_empty());
        for call in call_blocks {
            assert_eq!(call.inputs.len(), 2);
        }
    }

    // S5: exceeding the stack size bound hard-errors with no partial output.
    #[test]
    fn stack_overflow_produces_no_partial_output() {
        let source = leaked_source();
        let span = zero_span(source);
        let mut allocator = SlotAllocator::new();
        let mut program = mir::Program::new();
        program.declare_function(FunctionDeclaration {
            name: "Hello".to_string(),
            arguments: Vec::new(),
            return_type_view: TypeView { typ: Type::Untyped, slots: allocator.alloc_n(0), offset: 0 },
            body: mir::Block { statements: Vec::new(), span },
            proc_code: "Hello".to_string(),
            argument_ids: "[]".to_string(),
            warp: false,
            stack_size: 1,
            span,
        });
        let program = Box::leak(Box::new(program));

        let mut archive = archive();
        let mut omitter = Omitter::new(&mut archive, program).with_max_stack_size(0);
        omitter.set_target("Stage");
        let result = omitter.omit();
        assert!(matches!(result, Err(OmitError::StackOverflow { size: 1, max: 0 })));
        assert!(blocks(&archive).is_empty());
    }

    // S6: boolean literals lower to bare, operand-free blocks.
    #[test]
    fn boolean_literals_lower_to_bare_blocks() {
        let program: mir::Program<'static> = mir::Program::new();
        let program = Box::leak(Box::new(program));
        let mut archive = archive();
        let mut omitter = Omitter::new(&mut archive, program);
        omitter.set_target("Stage");

        let mut block_uuids = Vec::new();
        let true_uuid = omitter
            .omit_expression(&Expression::Literal(Literal::Bool(true)), &mut block_uuids)
            .unwrap()
            .remove(0);
        let false_uuid = omitter
            .omit_expression(&Expression::Literal(Literal::Bool(false)), &mut block_uuids)
            .unwrap()
            .remove(0);

        let target_blocks = blocks(&archive);
        let true_block = &target_blocks[&true_uuid];
        assert_eq!(true_block.opcode, "operator_not");
        assert!(true_block.inputs.is_empty());
        let false_block = &target_blocks[&false_uuid];
        assert_eq!(false_block.opcode, "operator_and");
        assert!(false_block.inputs.is_empty());
    }
}
