//! Lowering for expressions. Matches
//! `original_source/omitter/expression.go`'s `OmitExpression`/`OmitVariable`/
//! `OmitFunctionCall`.

use crate::mir;
use crate::target_ir::{Block, Field, Input, InputKind, MaybeShadowedInput};

use super::{OmitError, Omitter};

impl<'a, 'p> Omitter<'a, 'p> {
    /// Lowers an expression to the UUIDs of the blocks that hold its value
    /// (one per slot). Any block that must be spliced into the surrounding
    /// statement chain (a function call) is appended to `block_uuids`.
    pub(crate) fn omit_expression(
        &mut self,
        expression: &mir::Expression<'a>,
        block_uuids: &mut Vec<String>,
    ) -> Result<Vec<String>, OmitError> {
        match expression {
            mir::Expression::Literal(literal) => Ok(vec![self.omit_literal(literal)]),
            mir::Expression::Accessor(accessor) => self.omit_accessor_expression(accessor),
            mir::Expression::Call { function, arguments } => {
                self.omit_function_call(*function, arguments, block_uuids)
            }
            mir::Expression::Binary { .. } | mir::Expression::Unary { .. } => {
                Err(OmitError::NotImplemented)
            }
        }
    }

    fn omit_literal(&mut self, literal: &mir::Literal) -> String {
        match literal {
            mir::Literal::Number(value) => {
                let mut block = Block::new("operator_add");
                block.inputs.insert(
                    "NUM1".to_string(),
                    MaybeShadowedInput::Shadow(Input::Numeral {
                        kind: InputKind::Number,
                        value: *value,
                    }),
                );
                block.inputs.insert(
                    "NUM2".to_string(),
                    MaybeShadowedInput::Shadow(Input::Numeral {
                        kind: InputKind::Number,
                        value: 0.0,
                    }),
                );
                self.archive.insert_block(block)
            }
            mir::Literal::String(value) => {
                let mut block = Block::new("operator_join");
                block.inputs.insert(
                    "STRING1".to_string(),
                    MaybeShadowedInput::Shadow(Input::Text {
                        kind: InputKind::Str,
                        value: value.clone(),
                    }),
                );
                block.inputs.insert(
                    "STRING2".to_string(),
                    MaybeShadowedInput::Shadow(Input::Text {
                        kind: InputKind::Str,
                        value: String::new(),
                    }),
                );
                self.archive.insert_block(block)
            }
            mir::Literal::Bool(true) => self.archive.insert_block(Block::new("operator_not")),
            mir::Literal::Bool(false) => self.archive.insert_block(Block::new("operator_and")),
        }
    }

    fn omit_accessor_expression(&mut self, accessor: &mir::Accessor<'a>) -> Result<Vec<String>, OmitError> {
        let (base, type_view) = self.omit_accessor(accessor)?;
        let size = type_view.typ.size().ok_or(OmitError::DerefDynSized)?;

        let mut result = Vec::with_capacity(size as usize);
        let mut reused = false;
        for k in 0..size {
            let base_uuid = if reused {
                self.archive.copy_blocks(std::slice::from_ref(&base)).remove(0)
            } else {
                reused = true;
                base.clone()
            };

            let mut item_block = Block::new("data_itemoflist");
            item_block.fields.insert("LIST".to_string(), self.stack_field());
            let item_uuid = self.archive.insert_block(item_block);

            let mut subtract_block = Block::new("operator_subtract");
            subtract_block.inputs.insert(
                "NUM2".to_string(),
                MaybeShadowedInput::Shadow(Input::Numeral {
                    kind: InputKind::Number,
                    value: k as f64,
                }),
            );
            let subtract_uuid = self.archive.insert_block(subtract_block);
            self.archive.set_input(&subtract_uuid, "NUM1", &base_uuid);
            self.archive.set_input(&item_uuid, "INDEX", &subtract_uuid);

            result.push(item_uuid);
        }
        Ok(result)
    }

    pub(crate) fn omit_variable(&mut self, slot: &mir::slot::Slot) -> String {
        let mut block = Block::new("data_variable");
        block.fields.insert(
            "VARIABLE".to_string(),
            Field {
                value: slot.uuid.clone(),
                id: Some(slot.uuid.clone()),
            },
        );
        self.archive.insert_block(block)
    }

    fn omit_function_call(
        &mut self,
        function_ptr: crate::arena::P<mir::FunctionDeclaration<'a>>,
        arguments: &[mir::Expression<'a>],
        block_uuids: &mut Vec<String>,
    ) -> Result<Vec<String>, OmitError> {
        let function = self.program.function(function_ptr);
        if function.arguments.len() != arguments.len() {
            return Err(OmitError::ArityMismatch);
        }

        let warp_string = function.warp.to_string();
        let mut call_block = Block::new("procedures_call");
        call_block.mutation = Some(crate::target_ir::Mutation {
            tag_name: "mutation".to_string(),
            children: Vec::new(),
            proc_code: Some(function.proc_code.clone()),
            argument_ids: Some(function.argument_ids.clone()),
            warp: Some(warp_string),
            argument_names: None,
            argument_defaults: None,
            has_next: None,
        });
        let call_uuid = self.archive.insert_block(call_block);

        let parameters: Vec<_> = function
            .arguments
            .iter()
            .map(|argument| argument.type_view.slots.clone())
            .collect();
        let return_slots = function.return_type_view.slots.clone();

        for (slots, argument_expr) in parameters.iter().zip(arguments.iter()) {
            let expr_uuids = self.omit_expression(argument_expr, block_uuids)?;
            if slots.len() != expr_uuids.len() {
                return Err(OmitError::SlotCountMismatch);
            }
            for (slot, expr_uuid) in slots.iter().zip(expr_uuids.iter()) {
                self.archive.set_input(&call_uuid, &slot.uuid, expr_uuid);
            }
        }

        block_uuids.push(call_uuid);

        Ok(return_slots.iter().map(|slot| self.omit_variable(slot)).collect())
    }
}
