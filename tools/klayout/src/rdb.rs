//! Reading KLayout report databases (`.lyrdb`).
//!
//! A report database lists rule categories under `<categories>` and one
//! `<item>` per marker under `<items>`. Each item names its category in a
//! `<category>` child, optionally wrapped in single quotes.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::RuleCheck;
use crate::error::Error;

/// Marker counts of a report database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportDatabase {
    pub rule_checks: Vec<RuleCheck>,
}

impl ReportDatabase {
    /// Total number of markers (`<item>` elements).
    pub fn num_items(&self) -> usize {
        self.rule_checks
            .iter()
            .map(|rc| rc.num_results as usize)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_items() == 0
    }
}

/// Loads the report database at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<ReportDatabase, Error> {
    let file = File::open(path)?;
    parse(BufReader::new(file))
}

/// Parses a report database, counting items per category in order of first appearance.
pub fn parse<R: BufRead>(reader: R) -> Result<ReportDatabase, Error> {
    let mut reader = Reader::from_reader(reader);
    reader.trim_text(true);

    let mut counts: IndexMap<String, u32> = IndexMap::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut buf = Vec::new();
    let mut saw_root = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                let name = start.name().as_ref().to_vec();
                if stack.is_empty() {
                    saw_root = name == b"report-database";
                }
                if is_item(&stack, &name) {
                    *counts.entry(String::new()).or_default() += 1;
                }
                stack.push(name);
            }
            Event::Empty(start) => {
                if is_item(&stack, start.name().as_ref()) {
                    *counts.entry(String::new()).or_default() += 1;
                }
            }
            Event::Text(text) => {
                if in_item_category(&stack) {
                    let category = String::from_utf8_lossy(text.as_ref());
                    let category = category.trim().trim_matches('\'').to_string();
                    // Reattribute the item counted when its start tag was seen.
                    if let Some(unnamed) = counts.get_mut("") {
                        *unnamed -= 1;
                    }
                    *counts.entry(category).or_default() += 1;
                }
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(anyhow::anyhow!("not a KLayout report database").into());
    }

    let rule_checks = counts
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(name, num_results)| RuleCheck { name, num_results })
        .collect();
    Ok(ReportDatabase { rule_checks })
}

fn is_item(stack: &[Vec<u8>], name: &[u8]) -> bool {
    name == b"item" && stack.last().is_some_and(|parent| parent == b"items")
}

fn in_item_category(stack: &[Vec<u8>]) -> bool {
    matches!(
        stack,
        [.., items, item, category]
            if items == b"items" && item == b"item" && category == b"category"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<report-database>
 <description>sky130 DRC runset</description>
 <categories>
  <category>
   <name>m1.1</name>
   <description>m1.1 : min. m1 width : 0.14um</description>
   <categories/>
  </category>
  <category>
   <name>li.3</name>
   <description>li.3 : min. li spacing : 0.17um</description>
  </category>
 </categories>
 <cells>
  <cell>
   <name>tt_um_example</name>
  </cell>
 </cells>
 <items>
  <item>
   <tags/>
   <category>'m1.1'</category>
   <cell>tt_um_example</cell>
   <visited>false</visited>
   <multiplicity>1</multiplicity>
   <values>
    <value>edge-pair: (0,0;0.1,0)|(0,0.1;0.1,0.1)</value>
   </values>
  </item>
  <item>
   <category>'li.3'</category>
   <cell>tt_um_example</cell>
  </item>
  <item>
   <category>'m1.1'</category>
   <cell>tt_um_example</cell>
  </item>
 </items>
</report-database>
"#;

    #[test]
    fn counts_items_per_category() -> anyhow::Result<()> {
        let rdb = parse(REPORT.as_bytes())?;
        assert_eq!(rdb.num_items(), 3);
        assert_eq!(
            rdb.rule_checks,
            [
                RuleCheck {
                    name: "m1.1".to_string(),
                    num_results: 2
                },
                RuleCheck {
                    name: "li.3".to_string(),
                    num_results: 1
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_database_has_no_items() -> anyhow::Result<()> {
        let rdb = parse(
            "<?xml version=\"1.0\"?>\n<report-database><categories/><items/></report-database>"
                .as_bytes(),
        )?;
        assert!(rdb.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_other_documents() {
        assert!(parse("<testsuites/>".as_bytes()).is_err());
        assert!(parse("".as_bytes()).is_err());
    }
}
