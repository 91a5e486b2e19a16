//! Lowering for statements and variable accessors. Matches
//! `original_source/omitter/statement.go`'s `OmitStatement`/`OmitAcessor`.

use crate::mir;
use crate::target_ir::{Block, Field, Input, InputKind, MaybeShadowedInput};

use super::{OmitError, Omitter};

impl<'a, 'p> Omitter<'a, 'p> {
    pub(crate) fn omit_statement(&mut self, statement: &mir::Statement<'a>) -> Result<Vec<String>, OmitError> {
        match statement {
            mir::Statement::Declare { .. } => Ok(Vec::new()),
            mir::Statement::Assign { accessor, value, .. } => {
                let mut block_uuids = Vec::new();
                let expr_uuids = self.omit_expression(value, &mut block_uuids)?;
                let (base, type_view) = self.omit_accessor(accessor)?;
                let size = type_view.typ.size().ok_or(OmitError::AssignDynSized)?;
                if expr_uuids.len() as u32 != size {
                    return Err(OmitError::SlotCountMismatch);
                }

                let mut reused = false;
                for (k, expr_uuid) in expr_uuids.iter().enumerate() {
                    let base_uuid = if reused {
                        self.archive.copy_blocks(std::slice::from_ref(&base)).remove(0)
                    } else {
                        reused = true;
                        base.clone()
                    };

                    let mut replace_block = Block::new("data_replaceitemoflist");
                    replace_block
                        .fields
                        .insert("LIST".to_string(), self.stack_field());
                    let replace_uuid = self.archive.insert_block(replace_block);

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
                    self.archive.set_input(&replace_uuid, "INDEX", &subtract_uuid);
                    self.archive.set_input(&replace_uuid, "ITEM", expr_uuid);

                    block_uuids.push(replace_uuid);
                }
                Ok(block_uuids)
            }
            mir::Statement::Return { value, .. } => {
                let mut block_uuids = Vec::new();
                let expr_uuids = self.omit_expression(value, &mut block_uuids)?;
                let slots = self
                    .omitting_function
                    .expect("Return outside of a function body")
                    .return_type_view
                    .slots
                    .clone();
                if expr_uuids.len() != slots.len() {
                    return Err(OmitError::SlotCountMismatch);
                }
                for (slot, expr_uuid) in slots.iter().zip(expr_uuids.iter()) {
                    let mut set_var_block = Block::new("data_setvariableto");
                    set_var_block.fields.insert(
                        "VARIABLE".to_string(),
                        Field {
                            value: slot.uuid.clone(),
                            id: Some(slot.uuid.clone()),
                        },
                    );
                    let uuid = self.archive.insert_block(set_var_block);
                    self.archive.set_input(&uuid, "VALUE", expr_uuid);
                    block_uuids.push(uuid);
                }
                Ok(block_uuids)
            }
        }
    }

    /// Lowers an accessor to a base-index block (the `_Stack` position of
    /// slot 0 of the accessed value) plus the type view it addresses.
    pub(crate) fn omit_accessor(
        &mut self,
        accessor: &mir::Accessor<'a>,
    ) -> Result<(String, mir::TypeView), OmitError> {
        match accessor {
            mir::Accessor::Variable { type_view, .. } => {
                let mut length_block = Block::new("data_lengthoflist");
                length_block
                    .fields
                    .insert("LIST".to_string(), self.stack_field());
                let length_uuid = self.archive.insert_block(length_block);

                if type_view.offset == 0 {
                    return Ok((length_uuid, type_view.clone()));
                }

                let mut subtract_block = Block::new("operator_subtract");
                subtract_block.inputs.insert(
                    "NUM2".to_string(),
                    MaybeShadowedInput::Shadow(Input::Numeral {
                        kind: InputKind::Number,
                        value: type_view.offset as f64,
                    }),
                );
                let subtract_uuid = self.archive.insert_block(subtract_block);
                self.archive.set_input(&subtract_uuid, "NUM1", &length_uuid);
                Ok((subtract_uuid, type_view.clone()))
            }
        }
    }

    pub(crate) fn stack_field(&self) -> Field {
        Field {
            value: "_Stack".to_string(),
            id: Some(self.stack_uuid.clone()),
        }
    }
}
