//! PhyloXML reader and writer.
//!
//! The document is mapped through serde onto a set of XML-shaped structs and
//! then converted to and from [`Clade`]. Elements that the taxonomy store
//! has no use for (confidence, sequence, property, ...) are ignored on read.

use serde::{Deserialize, Serialize};

use crate::clade::{
    Clade, CladeDate, Distribution, Phylogeny, Point, Reference, Taxonomy, TaxonomyId,
};
use crate::domain::TreeFormat;
use crate::error::TaxaError;

use super::{DEFAULT_CONTEXT_LENGTH, ParsingError, ParsingErrorType, PhyloCodec};

pub const PHYLOXML_NAMESPACE: &str = "http://www.phyloxml.org";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

pub struct PhyloXmlCodec;

impl PhyloCodec for PhyloXmlCodec {
    fn format(&self) -> TreeFormat {
        TreeFormat::Phyloxml
    }

    fn parse(&self, input: &str) -> Result<Vec<Phylogeny>, TaxaError> {
        Ok(parse_str(input)?)
    }

    fn write(&self, trees: &[Phylogeny]) -> Result<String, TaxaError> {
        write_str(trees)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "phyloxml")]
struct PhyloXmlDoc {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    #[serde(default)]
    phylogeny: Vec<PhylogenyXml>,
}

fn default_rooted() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct PhylogenyXml {
    #[serde(rename = "@rooted", default = "default_rooted")]
    rooted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clade: Option<CladeXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CladeXml {
    #[serde(
        rename = "@branch_length",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    branch_length_attr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    taxonomy: Vec<TaxonomyXml>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    distribution: Vec<DistributionXml>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<DateXml>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    reference: Vec<ReferenceXml>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    clade: Vec<CladeXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TaxonomyXml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<IdXml>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<UriXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IdXml {
    #[serde(rename = "@provider", default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UriXml {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DistributionXml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    desc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    point: Vec<PointXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PointXml {
    #[serde(rename = "@geodetic_datum", default = "default_geodetic_datum")]
    geodetic_datum: String,
    lat: f64,
    long: f64,
}

fn default_geodetic_datum() -> String {
    "WGS84".to_string()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DateXml {
    #[serde(rename = "@unit", default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    maximum: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReferenceXml {
    #[serde(rename = "@doi", default, skip_serializing_if = "Option::is_none")]
    doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    desc: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

pub fn parse_str(input: &str) -> Result<Vec<Phylogeny>, ParsingError> {
    let doc: PhyloXmlDoc = quick_xml::de::from_str(input).map_err(|err| {
        let context: String = input.chars().take(DEFAULT_CONTEXT_LENGTH).collect();
        ParsingError::new(ParsingErrorType::InvalidXml(err.to_string()), 0, context)
    })?;

    let trees: Vec<Phylogeny> = doc
        .phylogeny
        .into_iter()
        .filter_map(|phylogeny| {
            let root = phylogeny.clade?;
            Some(Phylogeny {
                name: non_empty(phylogeny.name),
                rooted: phylogeny.rooted,
                root: clade_from_xml(root),
            })
        })
        .collect();

    if trees.is_empty() {
        return Err(ParsingError::new(ParsingErrorType::NoTrees, 0, ""));
    }
    Ok(trees)
}

fn clade_from_xml(xml: CladeXml) -> Clade {
    Clade {
        name: non_empty(xml.name),
        branch_length: xml.branch_length.or(xml.branch_length_attr),
        date: xml.date.map(|date| CladeDate {
            unit: non_empty(date.unit),
            desc: non_empty(date.desc),
            minimum: date.minimum,
            maximum: date.maximum,
        }),
        taxonomies: xml
            .taxonomy
            .into_iter()
            .map(|taxonomy| Taxonomy {
                id: taxonomy.id.and_then(|id| {
                    let value = id.value.trim().to_string();
                    (!value.is_empty()).then(|| TaxonomyId {
                        value,
                        provider: non_empty(id.provider),
                    })
                }),
                scientific_name: non_empty(taxonomy.scientific_name),
                rank: non_empty(taxonomy.rank),
                uri: non_empty(taxonomy.uri.map(|uri| uri.value)),
            })
            .collect(),
        distributions: xml
            .distribution
            .into_iter()
            .map(|distribution| Distribution {
                desc: non_empty(distribution.desc),
                points: distribution
                    .point
                    .into_iter()
                    .map(|point| Point {
                        geodetic_datum: point.geodetic_datum,
                        lat: point.lat,
                        long: point.long,
                    })
                    .collect(),
            })
            .collect(),
        references: xml
            .reference
            .into_iter()
            .map(|reference| Reference {
                desc: non_empty(reference.desc),
                doi: non_empty(reference.doi),
            })
            .collect(),
        clades: xml.clade.into_iter().map(clade_from_xml).collect(),
    }
}

fn clade_to_xml(clade: &Clade) -> CladeXml {
    CladeXml {
        branch_length_attr: None,
        name: clade.name.clone(),
        branch_length: clade.branch_length,
        taxonomy: clade
            .taxonomies
            .iter()
            .map(|taxonomy| TaxonomyXml {
                id: taxonomy.id.as_ref().map(|id| IdXml {
                    provider: id.provider.clone(),
                    value: id.value.clone(),
                }),
                scientific_name: taxonomy.scientific_name.clone(),
                rank: taxonomy.rank.clone(),
                uri: taxonomy.uri.clone().map(|value| UriXml { value }),
            })
            .collect(),
        distribution: clade
            .distributions
            .iter()
            .map(|distribution| DistributionXml {
                desc: distribution.desc.clone(),
                point: distribution
                    .points
                    .iter()
                    .map(|point| PointXml {
                        geodetic_datum: point.geodetic_datum.clone(),
                        lat: point.lat,
                        long: point.long,
                    })
                    .collect(),
            })
            .collect(),
        date: clade.date.as_ref().map(|date| DateXml {
            unit: date.unit.clone(),
            desc: date.desc.clone(),
            minimum: date.minimum,
            maximum: date.maximum,
        }),
        reference: clade
            .references
            .iter()
            .map(|reference| ReferenceXml {
                doi: reference.doi.clone(),
                desc: reference.desc.clone(),
            })
            .collect(),
        clade: clade.clades.iter().map(clade_to_xml).collect(),
    }
}

pub fn write_str(trees: &[Phylogeny]) -> Result<String, TaxaError> {
    let doc = PhyloXmlDoc {
        xmlns: Some(PHYLOXML_NAMESPACE.to_string()),
        phylogeny: trees
            .iter()
            .map(|tree| PhylogenyXml {
                rooted: tree.rooted,
                name: tree.name.clone(),
                description: None,
                clade: Some(clade_to_xml(&tree.root)),
            })
            .collect(),
    };

    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut body);
    serializer.indent(' ', 2);
    doc.serialize(serializer).map_err(|err| TaxaError::Serialize {
        format: TreeFormat::Phyloxml.to_string(),
        message: err.to_string(),
    })?;

    let mut out = String::with_capacity(XML_DECLARATION.len() + body.len() + 1);
    out.push_str(XML_DECLARATION);
    out.push_str(&body);
    out.push('\n');
    Ok(out)
}
