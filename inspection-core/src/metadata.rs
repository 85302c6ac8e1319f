//! Lookup from data element id to its display metadata.

use std::collections::HashMap;

use crate::{DataElement, OptionSet, ValueType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub display_name: String,
    pub value_type: ValueType,
    pub option_set: Option<OptionSet>,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    elements: HashMap<String, ElementInfo>,
}

impl MetadataIndex {
    /// Builds the index. Repeated ids keep the last definition.
    pub fn build(elements: &[DataElement]) -> Self {
        let elements = elements
            .iter()
            .map(|element| {
                (
                    element.id.clone(),
                    ElementInfo {
                        display_name: element.display_name.clone(),
                        value_type: element.value_type.clone(),
                        option_set: element.option_set.clone(),
                    },
                )
            })
            .collect();
        Self { elements }
    }

    pub fn get(&self, id: &str) -> Option<&ElementInfo> {
        self.elements.get(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChoiceOption;

    fn element(id: &str, name: &str, value_type: ValueType) -> DataElement {
        DataElement {
            id: id.into(),
            display_name: name.into(),
            value_type,
            option_set: None,
        }
    }

    #[test]
    fn resolves_known_ids() {
        let mut roof = element("de-roof", "Roof condition", ValueType::IntegerPositive);
        roof.option_set = Some(OptionSet {
            id: "os-cond".into(),
            options: vec![ChoiceOption {
                id: "o1".into(),
                code: "1".into(),
                display_name: "Very poor".into(),
            }],
        });
        let index = MetadataIndex::build(&[
            element("de-seats", "Seats", ValueType::Number),
            roof,
        ]);

        let seats = index.get("de-seats").unwrap();
        assert_eq!(seats.display_name, "Seats");
        assert_eq!(seats.value_type, ValueType::Number);
        assert!(seats.option_set.is_none());

        let roof = index.get("de-roof").unwrap();
        assert_eq!(roof.value_type, ValueType::IntegerPositive);
        assert_eq!(roof.option_set.as_ref().map(|s| s.options.len()), Some(1));
    }

    #[test]
    fn unknown_id_is_none() {
        let index = MetadataIndex::build(&[element("a", "A", ValueType::Number)]);
        assert!(index.get("missing").is_none());
        assert!(MetadataIndex::default().get("a").is_none());
    }

    #[test]
    fn last_definition_wins() {
        let index = MetadataIndex::build(&[
            element("dup", "First", ValueType::Number),
            element("dup", "Second", ValueType::IntegerPositive),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("dup").unwrap().display_name, "Second");
    }
}
