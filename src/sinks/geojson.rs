use super::{DataSink, FeatureId, FeatureRow};
use anyhow::Result;
use geojson::{Feature, FeatureCollection, feature::Id};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Collects every feature and writes a single FeatureCollection on
/// [`DataSink::finish`].
pub struct GeoJsonSink {
    writer: BufWriter<Box<dyn Write + Send>>,
    features: Vec<Feature>,
    compact: bool,
}

impl GeoJsonSink {
    pub fn new<P: AsRef<Path>>(path: P, compact: bool) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(Box::new(file), compact))
    }

    pub fn stdout(compact: bool) -> Self {
        Self::from_writer(Box::new(std::io::stdout()), compact)
    }

    fn from_writer(writer: Box<dyn Write + Send>, compact: bool) -> Self {
        Self {
            writer: BufWriter::new(writer),
            features: Vec::new(),
            compact,
        }
    }
}

impl DataSink for GeoJsonSink {
    fn add_feature(&mut self, row: FeatureRow) -> Result<()> {
        let id = match row.id {
            FeatureId::Number(id) => Id::Number(id.into()),
            FeatureId::String(id) => Id::String(id),
        };

        self.features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::from(&row.geometry)),
            id: Some(id),
            properties: Some(row.properties),
            foreign_members: None,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let collection = FeatureCollection {
            bbox: None,
            features: std::mem::take(&mut self.features),
            foreign_members: None,
        };

        if self.compact {
            serde_json::to_writer(&mut self.writer, &collection)?;
        } else {
            let mut serializer = serde_json::Serializer::with_formatter(
                &mut self.writer,
                PrettyFormatter::with_indent(b"\t"),
            );
            collection.serialize(&mut serializer)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
