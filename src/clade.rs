//! Transient nested tree representation exchanged with the format codecs.
//!
//! A [`Phylogeny`] exists only for the duration of one import or export; it is
//! never persisted.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Phylogeny {
    pub name: Option<String>,
    pub rooted: bool,
    pub root: Clade,
}

impl Phylogeny {
    pub fn new(root: Clade) -> Self {
        Self {
            name: None,
            rooted: true,
            root,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clade {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    pub date: Option<CladeDate>,
    pub taxonomies: Vec<Taxonomy>,
    pub distributions: Vec<Distribution>,
    pub references: Vec<Reference>,
    pub clades: Vec<Clade>,
}

impl Clade {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_branch_length(mut self, branch_length: f64) -> Self {
        self.branch_length = Some(branch_length);
        self
    }

    pub fn with_child(mut self, child: Clade) -> Self {
        self.clades.push(child);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.clades.is_empty()
    }

    /// This clade and all nested clades, depth-first pre-order.
    pub fn iter(&self) -> CladeIter<'_> {
        CladeIter { stack: vec![self] }
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Clade> {
        self.iter().filter(|clade| clade.is_terminal())
    }
}

pub struct CladeIter<'a> {
    stack: Vec<&'a Clade>,
}

impl<'a> Iterator for CladeIter<'a> {
    type Item = &'a Clade;

    fn next(&mut self) -> Option<Self::Item> {
        let clade = self.stack.pop()?;
        self.stack.extend(clade.clades.iter().rev());
        Some(clade)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CladeDate {
    pub unit: Option<String>,
    pub desc: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Taxonomy {
    pub id: Option<TaxonomyId>,
    pub scientific_name: Option<String>,
    pub rank: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaxonomyId {
    pub value: String,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Distribution {
    pub desc: Option<String>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub geodetic_datum: String,
    pub lat: f64,
    pub long: f64,
}

impl Point {
    pub fn wgs84(lat: f64, long: f64) -> Self {
        Self {
            geodetic_datum: "WGS84".to_string(),
            lat,
            long,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reference {
    pub desc: Option<String>,
    pub doi: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iter_is_preorder() {
        let tree = Clade::named("A")
            .with_child(Clade::named("B").with_child(Clade::named("C")))
            .with_child(Clade::named("D"));
        let names: Vec<_> = tree.iter().filter_map(|clade| clade.name.as_deref()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
        assert_eq!(tree.terminals().count(), 2);
    }
}
