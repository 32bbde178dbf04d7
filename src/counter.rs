use crate::models::AddressCount;
use std::collections::HashMap;

/// Count occurrences of each distinct value.
///
/// One entry per distinct value, in first-occurrence order. Values compare by
/// exact string equality.
pub fn count_occurrences<I, S>(values: I) -> Vec<AddressCount>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<AddressCount> = Vec::new();

    for value in values {
        let value = value.as_ref();
        match index.get(value) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(value.to_string(), counts.len());
                counts.push(AddressCount {
                    address: value.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts
}
