// src/transform/mod.rs
use anyhow::{Context, Result};
use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};
use serde_json::Value;
use tracing::{info, instrument, trace};

use crate::coordinates::{latlon_to_decimal, CoordinateError};

mod feature;

pub use feature::{Feature, Geometry, Properties};

pub const LAT_COLUMN: &str = "LAT";
pub const LON_COLUMN: &str = "LON";

/// Why a row produced no feature. Never surfaced past the transformer.
#[derive(Debug, Clone, PartialEq)]
pub enum RowSkip {
    /// LAT or LON column absent or empty.
    MissingCoordinate,
    Unparseable(CoordinateError),
    /// Source data uses 0 as "no coordinate".
    ZeroCoordinate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub rows: u64,
    pub features: u64,
    pub missing: u64,
    pub unparseable: u64,
    pub zero: u64,
}

impl TransformStats {
    pub fn skipped(&self) -> u64 {
        self.missing + self.unparseable + self.zero
    }

    fn record_skip(&mut self, skip: &RowSkip) {
        match skip {
            RowSkip::MissingCoordinate => self.missing += 1,
            RowSkip::Unparseable(_) => self.unparseable += 1,
            RowSkip::ZeroCoordinate => self.zero += 1,
        }
    }
}

/// Lazy, single-pass stream of features over a CSV reader.
pub struct Features<R: Read> {
    headers: Vec<String>,
    records: ByteRecordsIntoIter<R>,
    source: String,
    stats: TransformStats,
}

impl<R: Read> Features<R> {
    /// Counters for everything consumed so far.
    pub fn stats(&self) -> &TransformStats {
        &self.stats
    }

    fn feature_from(&self, record: &ByteRecord) -> std::result::Result<Feature, RowSkip> {
        let mut lat = None;
        let mut lon = None;
        let mut properties = Properties::default();

        for (name, raw) in self.headers.iter().zip(record.iter()) {
            let value = String::from_utf8_lossy(raw).into_owned();
            match name.as_str() {
                LAT_COLUMN => lat = Some(value),
                LON_COLUMN => lon = Some(value),
                _ => {
                    properties.insert(name.clone(), Value::String(value));
                }
            }
        }

        let (lat, lon) = match (lat, lon) {
            (Some(lat), Some(lon)) if !lat.is_empty() && !lon.is_empty() => (lat, lon),
            _ => return Err(RowSkip::MissingCoordinate),
        };

        let (lat, lon) = latlon_to_decimal(&lat, &lon).map_err(RowSkip::Unparseable)?;
        if lat == 0.0 || lon == 0.0 {
            return Err(RowSkip::ZeroCoordinate);
        }

        Ok(Feature::new(lon, lat, self.source.as_str(), properties))
    }
}

impl<R: Read> Iterator for Features<R> {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(r) => r,
                Err(e) => {
                    return Some(Err(e).context(format!(
                        "reading CSV record after row {}",
                        self.stats.rows
                    )))
                }
            };
            self.stats.rows += 1;

            match self.feature_from(&record) {
                Ok(feature) => {
                    self.stats.features += 1;
                    return Some(Ok(feature));
                }
                Err(skip) => {
                    trace!(row = self.stats.rows, reason = ?skip, "skipping row");
                    self.stats.record_skip(&skip);
                }
            }
        }
    }
}

/// Start transforming `reader`. The header row is consumed here; records are read lazily.
pub fn transform<R: Read>(reader: R, source: impl Into<String>) -> Result<Features<R>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .byte_headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    Ok(Features {
        headers,
        records: rdr.into_byte_records(),
        source: source.into(),
        stats: TransformStats::default(),
    })
}

/// Drain `features` into `sink`, one JSON object per line.
pub fn write_features<R: Read, W: Write>(
    mut features: Features<R>,
    mut sink: W,
) -> Result<TransformStats> {
    for feature in features.by_ref() {
        let feature = feature?;
        serde_json::to_writer(&mut sink, &feature).context("serializing feature")?;
        sink.write_all(b"\n").context("writing feature line")?;
    }
    sink.flush().context("flushing feature sink")?;
    Ok(features.stats)
}

/// Convert the CSV at `input` into line-delimited GeoJSON at `output`.
#[instrument(level = "info", skip_all, fields(input = %input.as_ref().display(), source = %source))]
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    source: &str,
) -> Result<TransformStats> {
    let input = input.as_ref();
    let output = output.as_ref();

    let reader = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let writer =
        File::create(output).with_context(|| format!("creating {}", output.display()))?;

    let features = transform(BufReader::new(reader), source)
        .with_context(|| format!("reading {}", input.display()))?;
    let stats = write_features(features, BufWriter::new(writer))
        .with_context(|| format!("converting {} to {}", input.display(), output.display()))?;

    info!(
        output = %output.display(),
        rows = stats.rows,
        features = stats.features,
        skipped = stats.skipped(),
        "converted"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,openaddresses_s3=trace")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn lines(csv: &str, source: &str) -> Result<(Vec<Value>, TransformStats)> {
        let mut out = Vec::new();
        let stats = write_features(transform(csv.as_bytes(), source)?, &mut out)?;
        let values = String::from_utf8(out)?
            .lines()
            .map(serde_json::from_str)
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        Ok((values, stats))
    }

    #[test]
    fn documented_row_becomes_feature() -> Result<()> {
        init_test_logging();
        let csv = "LAT,LON,STREET\n40.7128,-74.0060,Main St\n";
        let (out, stats) = lines(csv, "us/sample")?;

        assert_eq!(
            out,
            vec![json!({
                "type": "Feature",
                "geometry": {"coordinates": [-74.0060, 40.7128]},
                "source": "us/sample",
                "properties": {"STREET": "Main St"}
            })]
        );
        assert_eq!(stats.rows, 1);
        assert_eq!(stats.features, 1);
        Ok(())
    }

    #[test]
    fn bad_rows_are_skipped_and_later_rows_continue() -> Result<()> {
        init_test_logging();
        let csv = "\
NUMBER,LON,LAT,STREET
1,-74.0060,,Empty Lat
2,,40.7,Empty Lon
3,not-a-number,40.7,Garbage
4,0,40.7,Zero Lon
5,-74.0,0.0,Zero Lat
6,-74.0,95,Out Of Range
7,-73.9857,40.7484,Fifth Ave
";
        let (out, stats) = lines(csv, "us/ny/city")?;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["geometry"]["coordinates"], json!([-73.9857, 40.7484]));
        assert_eq!(out[0]["properties"], json!({"NUMBER": "7", "STREET": "Fifth Ave"}));

        assert_eq!(
            stats,
            TransformStats {
                rows: 7,
                features: 1,
                missing: 2,
                unparseable: 2,
                zero: 2,
            }
        );
        assert_eq!(stats.skipped(), 6);
        Ok(())
    }

    #[test]
    fn missing_coordinate_columns_skip_everything() -> Result<()> {
        let (out, stats) = lines("STREET,CITY\nMain St,Springfield\n", "x")?;
        assert!(out.is_empty());
        assert_eq!(stats.missing, 1);
        Ok(())
    }

    #[test]
    fn short_rows_pair_only_present_fields() -> Result<()> {
        let csv = "LAT,LON,STREET,UNIT\n40.1,-70.2,Elm\n40.1\n";
        let (out, stats) = lines(csv, "x")?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["properties"], json!({"STREET": "Elm"}));
        assert_eq!(stats.missing, 1);
        Ok(())
    }

    #[test]
    fn properties_keep_column_order_and_exclude_coordinates() -> Result<()> {
        let csv = "ZIP,LAT,CITY,LON,ADDR\n10001,40.75,New York,-73.99,1 Penn Plz\n";
        let mut features = transform(csv.as_bytes(), "x")?;
        let f = features.next().expect("one feature")?;

        let keys: Vec<&str> = f.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ZIP", "CITY", "ADDR"]);
        assert!(!f.properties.contains_key(LAT_COLUMN));
        assert!(!f.properties.contains_key(LON_COLUMN));
        assert_eq!((f.lon(), f.lat()), (-73.99, 40.75));
        assert!(features.next().is_none());
        Ok(())
    }

    #[test]
    fn dms_and_invalid_utf8_inputs() -> Result<()> {
        // degree sign is UTF-8, NAME ends in a stray latin-1 byte
        let csv: &[u8] = b"LAT,LON,NAME\n\"40\xc2\xb042'46\"\"N\",74 0 21.6 W,caf\xe9\n";

        let mut out = Vec::new();
        let stats = write_features(transform(csv, "x")?, &mut out)?;
        assert_eq!(stats.features, 1);

        let v: Value = serde_json::from_slice(&out)?;
        let coords = v["geometry"]["coordinates"].as_array().expect("array");
        assert!((coords[0].as_f64().unwrap() + 74.006).abs() < 1e-6);
        assert!((coords[1].as_f64().unwrap() - 40.712778).abs() < 1e-6);
        assert_eq!(v["properties"]["NAME"], json!("caf\u{FFFD}"));
        Ok(())
    }

    #[test]
    fn header_only_file_yields_nothing() -> Result<()> {
        let (out, stats) = lines("LAT,LON\n", "x")?;
        assert!(out.is_empty());
        assert_eq!(stats, TransformStats::default());
        Ok(())
    }

    #[test]
    fn convert_file_writes_geojson_lines() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let input = dir.path().join("city.csv");
        let output = dir.path().join("city.geojson");
        fs::write(&input, "LAT,LON,STREET\n1.5,2.5,A\n,,B\n3.5,4.5,C\n")?;

        let stats = convert_file(&input, &output, "us/ny/city")?;
        assert_eq!(stats.features, 2);

        let text = fs::read_to_string(&output)?;
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));
        let first: Value = serde_json::from_str(text.lines().next().unwrap())?;
        assert_eq!(first["source"], json!("us/ny/city"));
        assert_eq!(first["geometry"]["coordinates"], json!([2.5, 1.5]));
        Ok(())
    }

    #[test]
    fn convert_file_missing_input_errors() {
        let dir = tempdir().unwrap();
        let err = convert_file(
            dir.path().join("nope.csv"),
            dir.path().join("nope.geojson"),
            "x",
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("nope.csv"));
    }
}
