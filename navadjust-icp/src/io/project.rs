//! Project store interface.
//!
//! A project is a set of survey files, each split into sections, plus the
//! list of crossings between sections. The registration core reads it
//! concurrently from every worker and never mutates it.

use serde::{Deserialize, Serialize};

use crate::core::types::{CloudSide, Crossing, CrossingKey, Section, SectionRef};
use crate::error::{AlignError, Result};

/// Both sections of one crossing, hydrated and owned.
///
/// Moved into the alignment pipeline and dropped when it returns, which
/// releases the swath buffers exactly once on every path.
#[derive(Debug, Clone)]
pub struct CrossingData {
    /// Section 1 of the crossing
    pub target: Section,
    /// Section 2 of the crossing
    pub source: Section,
}

impl CrossingData {
    /// Section for one side.
    pub fn section(&self, side: CloudSide) -> &Section {
        match side {
            CloudSide::Target => &self.target,
            CloudSide::Source => &self.source,
        }
    }
}

/// Read-only access to a navigation adjustment project.
pub trait ProjectStore: Sync {
    /// All crossings, in project order.
    fn crossings(&self) -> &[Crossing];

    /// Hydrate both sections of `crossing` into owned buffers.
    fn load_crossing_data(&self, crossing: &Crossing) -> Result<CrossingData>;

    /// Crossing whose target/source match `key`, in that order.
    fn find_crossing(&self, key: &CrossingKey) -> Option<&Crossing> {
        self.crossings().iter().find(|c| c.key() == *key)
    }
}

/// One survey file and its sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SurveyFile {
    /// File id referenced by crossings
    pub file_id: u32,
    /// Original path of the survey file
    pub path: String,
    /// Sections in time order
    pub sections: Vec<Section>,
}

/// Project held entirely in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InMemoryProject {
    /// Project name
    pub name: String,
    /// Survey files
    pub files: Vec<SurveyFile>,
    /// Crossings between sections
    pub crossings: Vec<Crossing>,
}

impl InMemoryProject {
    /// Empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a section, creating its file entry on first use.
    pub fn add_section(&mut self, section: Section) {
        let file_id = section.info.file_id;
        match self.files.iter_mut().find(|f| f.file_id == file_id) {
            Some(file) => file.sections.push(section),
            None => self.files.push(SurveyFile {
                file_id,
                path: String::new(),
                sections: vec![section],
            }),
        }
    }

    /// Add a crossing.
    pub fn add_crossing(&mut self, crossing: Crossing) {
        self.crossings.push(crossing);
    }

    /// Look up a section.
    pub fn section(&self, reference: SectionRef) -> Option<&Section> {
        self.files
            .iter()
            .find(|f| f.file_id == reference.file_id)?
            .sections
            .iter()
            .find(|s| s.info.section_id == reference.section_id)
    }

    /// Total number of sections across files.
    pub fn section_count(&self) -> usize {
        self.files.iter().map(|f| f.sections.len()).sum()
    }

    fn cloned_section(&self, reference: SectionRef) -> Result<Section> {
        self.section(reference)
            .cloned()
            .ok_or(AlignError::SectionNotFound {
                file_id: reference.file_id,
                section_id: reference.section_id,
            })
    }
}

impl ProjectStore for InMemoryProject {
    fn crossings(&self) -> &[Crossing] {
        &self.crossings
    }

    fn load_crossing_data(&self, crossing: &Crossing) -> Result<CrossingData> {
        Ok(CrossingData {
            target: self.cloned_section(crossing.target)?,
            source: self.cloned_section(crossing.source)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Ping, Swath, Tie};

    fn section(file_id: u32, section_id: u32, pings: usize) -> Section {
        let pings = (0..pings)
            .map(|i| Ping {
                time_d: i as f64,
                beam_valid: vec![true; 2],
                bath: vec![50.0; 2],
                bathlon: vec![0.0; 2],
                bathlat: vec![0.0; 2],
                ..Default::default()
            })
            .collect();
        Section::new(file_id, section_id, Swath::new(pings))
    }

    fn project() -> InMemoryProject {
        let mut project = InMemoryProject::new("test");
        project.add_section(section(0, 0, 3));
        project.add_section(section(0, 1, 4));
        project.add_section(section(1, 0, 5));
        project.add_crossing(
            Crossing::new(SectionRef::new(0, 1), SectionRef::new(1, 0), 60)
                .with_tie(Tie::new(1.0, 2.0, 0.0)),
        );
        project
    }

    #[test]
    fn test_sections_grouped_by_file() {
        let project = project();
        assert_eq!(project.files.len(), 2);
        assert_eq!(project.section_count(), 3);
        assert_eq!(project.section(SectionRef::new(1, 0)).unwrap().info.num_pings, 5);
        assert!(project.section(SectionRef::new(2, 0)).is_none());
    }

    #[test]
    fn test_load_crossing_data() {
        let project = project();
        let crossing = project.crossings()[0].clone();
        let data = project.load_crossing_data(&crossing).unwrap();

        assert_eq!(data.target.info.num_pings, 4);
        assert_eq!(data.source.info.num_pings, 5);
        assert_eq!(data.section(CloudSide::Source).info.file_id, 1);
    }

    #[test]
    fn test_missing_section() {
        let project = project();
        let crossing = Crossing::new(SectionRef::new(0, 0), SectionRef::new(9, 9), 50);
        let err = project.load_crossing_data(&crossing).unwrap_err();
        assert!(matches!(
            err,
            AlignError::SectionNotFound {
                file_id: 9,
                section_id: 9
            }
        ));
    }

    #[test]
    fn test_find_crossing_is_order_sensitive() {
        let project = project();
        assert!(project.find_crossing(&CrossingKey::new(0, 1, 1, 0)).is_some());
        assert!(project.find_crossing(&CrossingKey::new(1, 0, 0, 1)).is_none());
    }
}
