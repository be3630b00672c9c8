//! Dataset I/O implementations and histogram export helpers.

use super::*;
use arrow::{
    array::{
        Array, ArrayRef, Float32Array, Float64Array, Float64Builder, Int32Array, Int32Builder,
        ListArray, ListBuilder,
    },
    datatypes::DataType,
    record_batch::RecordBatch,
};
use oxyroot::{Branch, Named, ReaderTree, RootFile, WriterTree};
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::utils::Histogram;
use crate::{DimuError, DimuResult};

fn canonicalize_dataset_path(file_path: &str) -> DimuResult<PathBuf> {
    Ok(Path::new(&*shellexpand::full(file_path)?).canonicalize()?)
}

pub(crate) fn expand_output_path(file_path: &str) -> DimuResult<PathBuf> {
    Ok(PathBuf::from(&*shellexpand::full(file_path)?))
}

/// Options controlling how a dataset is located inside its file
#[derive(Clone, Debug)]
pub struct DatasetReadOptions {
    /// The name of the TTree to read, or `None` to use the only TTree in the file
    pub tree: Option<String>,
    /// The name of the particle collection whose branches hold the per-event records
    pub collection: String,
}

impl Default for DatasetReadOptions {
    fn default() -> Self {
        Self {
            tree: None,
            collection: "MCParticles".to_string(),
        }
    }
}

impl DatasetReadOptions {
    /// Select a TTree by name instead of autodetecting one
    pub fn with_tree<S: Into<String>>(mut self, tree: S) -> Self {
        self.tree = Some(tree.into());
        self
    }

    /// Select the particle collection whose branches are read
    pub fn with_collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.collection = collection.into();
        self
    }
}

/// Load a [`Dataset`], dispatching on the file extension.
pub fn open_dataset(file_path: &str, options: &DatasetReadOptions) -> DimuResult<Arc<Dataset>> {
    let extension = Path::new(file_path)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "root" => read_root(file_path, options),
        "parquet" | "parq" => read_parquet(file_path),
        _ => Err(DimuError::Custom(format!(
            "Unsupported dataset format '{file_path}'; expected a .root or .parquet file"
        ))),
    }
}

/// Load a [`Dataset`] from a ROOT TTree using the oxyroot backend.
pub fn read_root(file_path: &str, options: &DatasetReadOptions) -> DimuResult<Arc<Dataset>> {
    let path = canonicalize_dataset_path(file_path)?;
    let mut file = RootFile::open(&path).map_err(|err| {
        DimuError::Custom(format!(
            "Failed to open ROOT file '{}': {err}",
            path.display()
        ))
    })?;

    let (tree, tree_name) = resolve_root_tree(&mut file, options.tree.as_deref())?;
    let collection = &options.collection;
    let pdg = read_jagged_ints(&tree, &tree_name, &format!("{collection}.PDG"))?;
    let px = read_jagged_floats(&tree, &tree_name, &format!("{collection}.momentum.x"))?;
    let py = read_jagged_floats(&tree, &tree_name, &format!("{collection}.momentum.y"))?;
    let pz = read_jagged_floats(&tree, &tree_name, &format!("{collection}.momentum.z"))?;
    let mass = read_jagged_floats(&tree, &tree_name, &format!("{collection}.mass"))?;

    let n_events = pdg.len();
    for (name, column) in [
        ("momentum.x", &px),
        ("momentum.y", &py),
        ("momentum.z", &pz),
        ("mass", &mass),
    ] {
        if column.len() != n_events {
            return Err(DimuError::LengthMismatch {
                context: format!("Branch '{collection}.{name}'"),
                expected: n_events,
                actual: column.len(),
            });
        }
    }

    let weights = match read_scalar_floats_optional(&tree, "weight")? {
        Some(values) => {
            if values.len() != n_events {
                return Err(DimuError::LengthMismatch {
                    context: "Branch 'weight'".to_string(),
                    expected: n_events,
                    actual: values.len(),
                });
            }
            values
        }
        None => vec![1.0; n_events],
    };

    let mut events = Vec::with_capacity(n_events);
    for i in 0..n_events {
        let n_particles = pdg[i].len();
        for (name, column) in [
            ("momentum.x", &px),
            ("momentum.y", &py),
            ("momentum.z", &pz),
            ("mass", &mass),
        ] {
            if column[i].len() != n_particles {
                return Err(DimuError::LengthMismatch {
                    context: format!("Entry {i} of '{collection}.{name}'"),
                    expected: n_particles,
                    actual: column[i].len(),
                });
            }
        }
        let particles = (0..n_particles)
            .map(|j| {
                Particle::new(
                    pdg[i][j],
                    Vec3::new(px[i][j], py[i][j], pz[i][j]),
                    mass[i][j],
                )
            })
            .collect();
        events.push(EventData {
            particles,
            weight: weights[i],
        });
    }

    Ok(Arc::new(Dataset::from_events(events)))
}

fn resolve_root_tree(
    file: &mut RootFile,
    requested: Option<&str>,
) -> DimuResult<(ReaderTree, String)> {
    if let Some(name) = requested {
        let tree = file
            .get_tree(name)
            .map_err(|err| map_root_error(&format!("Failed to open ROOT tree '{name}'"), err))?;
        return Ok((tree, name.to_string()));
    }

    let tree_names: Vec<String> = file
        .keys()
        .into_iter()
        .filter(|key| key.class_name() == "TTree")
        .map(|key| key.name().to_string())
        .collect();

    if tree_names.is_empty() {
        return Err(DimuError::Custom(
            "ROOT file does not contain any TTrees".to_string(),
        ));
    }
    if tree_names.len() > 1 {
        return Err(DimuError::Custom(format!(
            "Multiple TTrees found ({:?}); specify DatasetReadOptions::tree to disambiguate",
            tree_names
        )));
    }

    let selected = &tree_names[0];
    let tree = file
        .get_tree(selected)
        .map_err(|err| map_root_error(&format!("Failed to open ROOT tree '{selected}'"), err))?;
    Ok((tree, selected.clone()))
}

fn map_root_error<E: std::fmt::Display>(context: &str, err: E) -> DimuError {
    DimuError::Custom(format!("{context}: {err}"))
}

fn find_branch<'a>(tree: &'a ReaderTree, tree_name: &str, name: &str) -> DimuResult<&'a Branch> {
    tree.branch(name).ok_or_else(|| DimuError::MissingBranch {
        name: name.to_string(),
        tree: tree_name.to_string(),
    })
}

fn read_jagged_floats(
    tree: &ReaderTree,
    tree_name: &str,
    name: &str,
) -> DimuResult<Vec<Vec<f64>>> {
    let branch = find_branch(tree, tree_name, name)?;
    let type_name = branch.item_type_name();
    let lower = type_name.to_ascii_lowercase();
    let values = if lower.contains("double") {
        branch
            .as_iter::<Vec<f64>>()
            .map_err(|err| map_root_error(&format!("Failed to read branch '{name}'"), err))?
            .collect()
    } else if lower.contains("float") {
        branch
            .as_iter::<Vec<f32>>()
            .map_err(|err| map_root_error(&format!("Failed to read branch '{name}'"), err))?
            .map(|row| row.into_iter().map(|value| value as f64).collect())
            .collect()
    } else {
        return Err(DimuError::InvalidColumnType {
            name: name.to_string(),
            datatype: type_name.to_string(),
        });
    };
    Ok(values)
}

fn read_jagged_ints(tree: &ReaderTree, tree_name: &str, name: &str) -> DimuResult<Vec<Vec<i32>>> {
    let branch = find_branch(tree, tree_name, name)?;
    let type_name = branch.item_type_name();
    let lower = type_name.to_ascii_lowercase();
    let values = if lower.contains("int64") || lower.contains("long") {
        branch
            .as_iter::<Vec<i64>>()
            .map_err(|err| map_root_error(&format!("Failed to read branch '{name}'"), err))?
            .map(|row| row.into_iter().map(|value| value as i32).collect())
            .collect()
    } else if lower.contains("int") {
        branch
            .as_iter::<Vec<i32>>()
            .map_err(|err| map_root_error(&format!("Failed to read branch '{name}'"), err))?
            .collect()
    } else {
        return Err(DimuError::InvalidColumnType {
            name: name.to_string(),
            datatype: type_name.to_string(),
        });
    };
    Ok(values)
}

fn read_scalar_floats_optional(tree: &ReaderTree, name: &str) -> DimuResult<Option<Vec<f64>>> {
    let Some(branch) = tree.branch(name) else {
        return Ok(None);
    };
    let type_name = branch.item_type_name();
    let lower = type_name.to_ascii_lowercase();
    let values = match lower.as_str() {
        "float" | "float_t" | "float32_t" => branch
            .as_iter::<f32>()
            .map_err(|err| map_root_error(&format!("Failed to read branch '{name}'"), err))?
            .map(|value| value as f64)
            .collect(),
        "double" | "double_t" | "double32_t" => branch
            .as_iter::<f64>()
            .map_err(|err| map_root_error(&format!("Failed to read branch '{name}'"), err))?
            .collect(),
        _ => {
            return Err(DimuError::InvalidColumnType {
                name: name.to_string(),
                datatype: type_name.to_string(),
            })
        }
    };
    Ok(Some(values))
}

/// Load a [`Dataset`] from a Parquet file.
pub fn read_parquet(file_path: &str) -> DimuResult<Arc<Dataset>> {
    let path = canonicalize_dataset_path(file_path)?;
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;
    let mut events = Vec::new();
    for batch in reader {
        let batch = batch?;
        append_record_batch_events(&batch, &mut events)?;
    }
    Ok(Arc::new(Dataset::from_events(events)))
}

fn append_record_batch_events(
    batch: &RecordBatch,
    events: &mut Vec<EventData>,
) -> DimuResult<()> {
    let pdg = prepare_int_list_column(batch, "pdg")?;
    let px = prepare_float_list_column(batch, "px")?;
    let py = prepare_float_list_column(batch, "py")?;
    let pz = prepare_float_list_column(batch, "pz")?;
    let mass = prepare_float_list_column(batch, "mass")?;
    let weight = find_float_column(batch, "weight")?;

    for row in 0..batch.num_rows() {
        let pdgs = pdg.values(row);
        let pxs = px.values(row);
        let pys = py.values(row);
        let pzs = pz.values(row);
        let masses = mass.values(row);
        for (name, column) in [("px", &pxs), ("py", &pys), ("pz", &pzs), ("mass", &masses)] {
            if column.len() != pdgs.len() {
                return Err(DimuError::LengthMismatch {
                    context: format!("Row {row} of column '{name}'"),
                    expected: pdgs.len(),
                    actual: column.len(),
                });
            }
        }
        let particles = (0..pdgs.len())
            .map(|i| {
                Particle::new(
                    pdgs[i],
                    Vec3::new(pxs[i], pys[i], pzs[i]),
                    masses[i],
                )
            })
            .collect();
        events.push(EventData {
            particles,
            weight: weight.map(|column| column.value(row)).unwrap_or(1.0),
        });
    }

    Ok(())
}

/// Persist a [`Dataset`] to a Parquet file.
pub fn write_parquet(dataset: &Dataset, file_path: &str) -> DimuResult<()> {
    let path = expand_output_path(file_path)?;
    let mut pdg_builder = ListBuilder::new(Int32Builder::new());
    let mut px_builder = ListBuilder::new(Float64Builder::new());
    let mut py_builder = ListBuilder::new(Float64Builder::new());
    let mut pz_builder = ListBuilder::new(Float64Builder::new());
    let mut mass_builder = ListBuilder::new(Float64Builder::new());
    let mut weights = Vec::with_capacity(dataset.n_events());

    for event in dataset.iter() {
        for particle in &event.particles {
            pdg_builder.values().append_value(particle.pdg);
            px_builder.values().append_value(particle.momentum.x);
            py_builder.values().append_value(particle.momentum.y);
            pz_builder.values().append_value(particle.momentum.z);
            mass_builder.values().append_value(particle.mass);
        }
        pdg_builder.append(true);
        px_builder.append(true);
        py_builder.append(true);
        pz_builder.append(true);
        mass_builder.append(true);
        weights.push(event.weight);
    }

    let batch = RecordBatch::try_from_iter([
        ("pdg", Arc::new(pdg_builder.finish()) as ArrayRef),
        ("px", Arc::new(px_builder.finish()) as ArrayRef),
        ("py", Arc::new(py_builder.finish()) as ArrayRef),
        ("pz", Arc::new(pz_builder.finish()) as ArrayRef),
        ("mass", Arc::new(mass_builder.finish()) as ArrayRef),
        ("weight", Arc::new(Float64Array::from(weights)) as ArrayRef),
    ])?;

    let file = File::create(&path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|err| DimuError::Custom(format!("Failed to create Parquet writer: {err}")))?;
    writer
        .write(&batch)
        .map_err(|err| DimuError::Custom(format!("Failed to write Parquet batch: {err}")))?;
    writer
        .close()
        .map_err(|err| DimuError::Custom(format!("Failed to finalise Parquet file: {err}")))?;

    Ok(())
}

/// Persist a [`Histogram`] to a ROOT file as a TTree with one entry per bin.
pub fn write_histogram_root(
    histogram: &Histogram,
    file_path: &str,
    tree_name: &str,
) -> DimuResult<()> {
    let path = expand_output_path(file_path)?;
    let bins = histogram.bins();
    let bin_lo = histogram.bin_edges[..bins].to_vec();
    let bin_hi = histogram.bin_edges[1..].to_vec();
    let counts = histogram.counts.clone();

    let mut file = RootFile::create(&path).map_err(|err| {
        DimuError::Custom(format!(
            "Failed to create ROOT file '{}': {err}",
            path.display()
        ))
    })?;

    let mut tree = WriterTree::new(tree_name);
    tree.new_branch("bin_lo", bin_lo.into_iter());
    tree.new_branch("bin_hi", bin_hi.into_iter());
    tree.new_branch("count", counts.into_iter());

    tree.write(&mut file).map_err(|err| {
        DimuError::Custom(format!(
            "Failed to write ROOT tree '{tree_name}' to '{}': {err}",
            path.display()
        ))
    })?;

    file.close().map_err(|err| {
        DimuError::Custom(format!(
            "Failed to close ROOT file '{}': {err}",
            path.display()
        ))
    })?;

    Ok(())
}

/// Persist a [`Histogram`] to a JSON file.
pub fn write_histogram_json(histogram: &Histogram, file_path: &str) -> DimuResult<()> {
    let path = expand_output_path(file_path)?;
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, histogram).map_err(|err| {
        DimuError::Custom(format!(
            "Failed to serialise histogram to '{}': {err}",
            path.display()
        ))
    })?;
    Ok(())
}

#[derive(Clone, Copy)]
enum FloatColumn<'a> {
    F32(&'a Float32Array),
    F64(&'a Float64Array),
}

impl FloatColumn<'_> {
    fn value(&self, row: usize) -> f64 {
        match self {
            Self::F32(array) => array.value(row) as f64,
            Self::F64(array) => array.value(row),
        }
    }
}

enum FloatListColumn<'a> {
    F32(&'a ListArray),
    F64(&'a ListArray),
}

impl FloatListColumn<'_> {
    fn values(&self, row: usize) -> Vec<f64> {
        match self {
            Self::F32(array) => {
                let list = array.value(row);
                let values = list
                    .as_any()
                    .downcast_ref::<Float32Array>()
                    .expect("List advertised as Float32 items but could not be downcast");
                values.values().iter().map(|&value| value as f64).collect()
            }
            Self::F64(array) => {
                let list = array.value(row);
                let values = list
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .expect("List advertised as Float64 items but could not be downcast");
                values.values().to_vec()
            }
        }
    }
}

struct IntListColumn<'a>(&'a ListArray);

impl IntListColumn<'_> {
    fn values(&self, row: usize) -> Vec<i32> {
        let list = self.0.value(row);
        let values = list
            .as_any()
            .downcast_ref::<Int32Array>()
            .expect("List advertised as Int32 items but could not be downcast");
        values.values().to_vec()
    }
}

fn find_float_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> DimuResult<Option<FloatColumn<'a>>> {
    let Some(column) = batch.column_by_name(name) else {
        return Ok(None);
    };
    match column.data_type() {
        DataType::Float32 => Ok(Some(FloatColumn::F32(
            column
                .as_any()
                .downcast_ref::<Float32Array>()
                .expect("Column advertised as Float32 but could not be downcast"),
        ))),
        DataType::Float64 => Ok(Some(FloatColumn::F64(
            column
                .as_any()
                .downcast_ref::<Float64Array>()
                .expect("Column advertised as Float64 but could not be downcast"),
        ))),
        other => Err(DimuError::InvalidColumnType {
            name: name.to_string(),
            datatype: other.to_string(),
        }),
    }
}

fn prepare_float_list_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> DimuResult<FloatListColumn<'a>> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| DimuError::MissingColumn {
            name: name.to_string(),
        })?;
    let DataType::List(field) = column.data_type() else {
        return Err(DimuError::InvalidColumnType {
            name: name.to_string(),
            datatype: column.data_type().to_string(),
        });
    };
    let list = column
        .as_any()
        .downcast_ref::<ListArray>()
        .expect("Column advertised as List but could not be downcast");
    match field.data_type() {
        DataType::Float32 => Ok(FloatListColumn::F32(list)),
        DataType::Float64 => Ok(FloatListColumn::F64(list)),
        other => Err(DimuError::InvalidColumnType {
            name: name.to_string(),
            datatype: other.to_string(),
        }),
    }
}

fn prepare_int_list_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> DimuResult<IntListColumn<'a>> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| DimuError::MissingColumn {
            name: name.to_string(),
        })?;
    let DataType::List(field) = column.data_type() else {
        return Err(DimuError::InvalidColumnType {
            name: name.to_string(),
            datatype: column.data_type().to_string(),
        });
    };
    if field.data_type() != &DataType::Int32 {
        return Err(DimuError::InvalidColumnType {
            name: name.to_string(),
            datatype: field.data_type().to_string(),
        });
    }
    let list = column
        .as_any()
        .downcast_ref::<ListArray>()
        .expect("Column advertised as List but could not be downcast");
    Ok(IntListColumn(list))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::data::test_dataset;

    #[test]
    fn test_parquet_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.parquet");
        let path_str = path.to_str().unwrap();
        let dataset = test_dataset();
        write_parquet(&dataset, path_str).unwrap();
        let loaded = open_dataset(path_str, &DatasetReadOptions::default()).unwrap();
        assert_eq!(loaded.n_events(), 1);
        assert_eq!(loaded[0].particles, dataset[0].particles);
        assert_eq!(loaded[0].weight, dataset[0].weight);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = open_dataset("events.csv", &DatasetReadOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_histogram_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("histogram.json");
        let mut histogram = Histogram::new(4, (0.0, 2.0)).unwrap();
        histogram.fill(0.5);
        histogram.fill(3.0);
        write_histogram_json(&histogram, path.to_str().unwrap()).unwrap();
        let file = File::open(&path).unwrap();
        let loaded: Histogram = serde_json::from_reader(file).unwrap();
        assert_eq!(loaded.counts, histogram.counts);
        assert_eq!(loaded.bin_edges, histogram.bin_edges);
        assert_eq!(loaded.overflow, histogram.overflow);
    }
}
