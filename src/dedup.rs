use std::collections::HashMap;

use crate::models::ListingRecord;

/// Collapse records sharing a `link`.
///
/// The last record seen for a link wins, but it takes the slot where that
/// link first appeared, so output order follows first occurrence.
pub fn deduplicate(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<ListingRecord> = Vec::with_capacity(records.len());

    for record in records {
        match slots.get(&record.link) {
            Some(&idx) => unique[idx] = record,
            None => {
                slots.insert(record.link.clone(), unique.len());
                unique.push(record);
            }
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;

    #[test]
    fn later_record_wins_at_first_position() {
        let input = vec![
            record("Dacia Logan", "https://x/1"),
            record("Renault Clio", "https://x/2"),
            record("Dacia Logan 1.5 dCi", "https://x/1"),
        ];

        let out = deduplicate(input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].link, "https://x/1");
        assert_eq!(out[0].title, "Dacia Logan 1.5 dCi");
        assert_eq!(out[1].title, "Renault Clio");
    }

    #[test]
    fn deduplicate_is_idempotent() {
        let input = vec![
            record("A", "https://x/1"),
            record("B", "https://x/2"),
            record("C", "https://x/1"),
            record("D", "https://x/3"),
            record("E", "https://x/2"),
        ];

        let once = deduplicate(input);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
        assert_eq!(
            once.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(),
            vec!["C", "E", "D"]
        );
    }

    #[test]
    fn empty_input() {
        assert!(deduplicate(Vec::new()).is_empty());
    }
}
