use super::{template, MongoDbBackend};
use crate::ast::ConditionNode;
use crate::error::Result;

impl MongoDbBackend {
    /// Converts a condition tree into a MongoDB query document.
    pub fn translate(&self, node: &ConditionNode) -> Result<String> {
        match node {
            ConditionNode::And(children) => self.combine(self.dialect.and_token, children),
            ConditionNode::Or(children) => self.combine(self.dialect.or_token, children),
            // NOT over OR: each alternative is negated on its own
            ConditionNode::Not(child) => match child.as_ref() {
                ConditionNode::Or(alternatives) => {
                    self.combine(self.dialect.not_token, alternatives)
                }
                other => self.combine(self.dialect.not_token, std::slice::from_ref(other)),
            },
            ConditionNode::Leaf(leaf) => self.translate_leaf(leaf),
        }
    }

    fn combine(&self, op: &str, children: &[ConditionNode]) -> Result<String> {
        let children = children
            .iter()
            .map(|child| self.translate(child))
            .collect::<Result<Vec<_>>>()?;
        Ok(template::group(op, &children, self.dialect.list_separator))
    }
}
