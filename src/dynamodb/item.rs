use aws_sdk_dynamodb::types::AttributeValue;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

/// A single stored record as a map of attribute names to DynamoDB values.
///
/// Both store backends exchange records in this shape, so the same item built by
/// a repository can be handed to DynamoDB or kept by the in-memory store.
///
/// # Example
///
/// ```
/// use budget_store::dynamodb::Item;
///
/// let item = Item::new()
///     .set_string("userId#month", "u1#2024-01")
///     .set_string("incomeItemName", "salary")
///     .set_number("incomeItemValue", 5000.0);
/// assert_eq!(item.get_number("incomeItemValue"), Some(5000.0));
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) attributes: HashMap<String, AttributeValue>,
}

impl Item {
    /// Creates a new empty `Item`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marshals a serializable record into an item using its serde field names.
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self, serde_dynamo::Error> {
        let attributes: HashMap<String, AttributeValue> = serde_dynamo::to_item(record)?;
        Ok(Self { attributes })
    }

    /// Unmarshals the item into a record. Attributes the record doesn't know are ignored.
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T, serde_dynamo::Error> {
        serde_dynamo::from_item(self.attributes.clone())
    }

    /// Sets a string attribute.
    pub fn set_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::S(value.into()));
        self
    }

    /// Sets a number attribute.
    ///
    /// DynamoDB numbers travel as strings; `f64`'s `Display` round-trips exactly.
    pub fn set_number(mut self, key: impl Into<String>, value: impl Into<f64>) -> Self {
        self.attributes
            .insert(key.into(), AttributeValue::N(value.into().to_string()));
        self
    }

    /// Sets an ordered list of strings (stored as `L`, not as a string set, so order
    /// and duplicates survive).
    pub fn set_string_list<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = values
            .into_iter()
            .map(|v| AttributeValue::S(v.into()))
            .collect();
        self.attributes.insert(key.into(), AttributeValue::L(list));
        self
    }

    /// Gets the value of an attribute as a string.
    ///
    /// Returns `None` if the attribute doesn't exist or is not a string.
    pub fn get_string(&self, key: &str) -> Option<&String> {
        self.attributes.get(key).and_then(|av| av.as_s().ok())
    }

    /// Gets the value of an attribute as a number (f64).
    ///
    /// Returns `None` if the attribute doesn't exist, is not a number, or can't be parsed as f64.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_n().ok())
            .and_then(|n| n.parse().ok())
    }

    /// Gets a list attribute whose elements are all strings.
    pub fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        self.attributes
            .get(key)
            .and_then(|av| av.as_l().ok())
            .and_then(|list| {
                list.iter()
                    .map(|v| v.as_s().ok().cloned())
                    .collect::<Option<Vec<_>>>()
            })
    }

    /// Overwrites every attribute of `self` that `other` names.
    pub fn merge(&mut self, other: Item) {
        self.attributes.extend(other.attributes);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Name of the first number attribute DynamoDB can't store: NaN or infinite.
    pub fn non_finite_number(&self) -> Option<&str> {
        self.attributes.iter().find_map(|(name, value)| match value {
            AttributeValue::N(n) if n.parse::<f64>().map_or(true, |v| !v.is_finite()) => {
                Some(name.as_str())
            }
            _ => None,
        })
    }
}

impl From<HashMap<String, AttributeValue>> for Item {
    fn from(attributes: HashMap<String, AttributeValue>) -> Self {
        Self { attributes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        item_name: String,
        item_value: f64,
        tags: Vec<String>,
    }

    #[test]
    fn test_item_operations() {
        let item = Item::new()
            .set_string("key1", "value1")
            .set_number("key2", 42.0)
            .set_string_list("key3", ["b", "a", "b"]);

        assert_eq!(item.get_string("key1"), Some(&"value1".to_string()));
        assert_eq!(item.get_number("key2"), Some(42.0));
        assert_eq!(
            item.get_string_list("key3"),
            Some(vec!["b".to_string(), "a".to_string(), "b".to_string()])
        );
        assert_eq!(item.get_string("non_existent"), None);
        assert_eq!(item.get_number("key1"), None);
        assert_eq!(item.attributes.len(), 3);
        assert_eq!(item.non_finite_number(), None);
    }

    #[test]
    fn test_merge_overwrites_only_named_attributes() {
        let mut item = Item::new()
            .set_string("name", "rent")
            .set_number("value", 1200.0);
        item.merge(Item::new().set_number("value", 1300.0));

        assert_eq!(item.get_string("name"), Some(&"rent".to_string()));
        assert_eq!(item.get_number("value"), Some(1300.0));
    }

    #[test]
    fn test_non_finite_numbers_are_found() {
        let item = Item::new()
            .set_string("name", "rent")
            .set_number("value", f64::NAN);
        assert_eq!(item.non_finite_number(), Some("value"));

        let item = Item::new().set_number("value", f64::NEG_INFINITY);
        assert_eq!(item.non_finite_number(), Some("value"));

        let sample = Sample {
            item_name: "groceries".to_string(),
            item_value: f64::INFINITY,
            tags: vec![],
        };
        let item = Item::from_record(&sample).unwrap();
        assert_eq!(item.non_finite_number(), Some("itemValue"));
    }

    #[test]
    fn test_record_marshalling_uses_serde_names() {
        let sample = Sample {
            item_name: "groceries".to_string(),
            item_value: 82.5,
            tags: vec!["food".to_string(), "weekly".to_string()],
        };
        let item = Item::from_record(&sample).unwrap();

        assert_eq!(item.get_string("itemName"), Some(&"groceries".to_string()));
        assert_eq!(item.get_number("itemValue"), Some(82.5));
        assert_eq!(
            item.get_string_list("tags"),
            Some(vec!["food".to_string(), "weekly".to_string()])
        );

        let extra = item.set_string("userId#month", "u1#2024-01");
        let decoded: Sample = extra.to_record().unwrap();
        assert_eq!(decoded, sample);
    }
}
