//src/biom.rs

use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::BiomOptions;
use crate::error::{ProfileError, Result};
use crate::output::write_atomically;
use crate::profile::ProfileMatrix;
use crate::reader::open_text;

pub const BIOM_FORMAT_URL: &str = "http://biom-format.org";
pub const BIOM_JSON_FORMAT: &str = "Biological Observation Matrix 1.0.0";

/// On-disk flavour of a BIOM table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiomFormat {
    /// BIOM 1.0: sparse JSON document.
    Json,
    /// BIOM 2.1: HDF5 file.
    #[cfg(feature = "hdf5")]
    Hdf5,
}

/// Compressed sparse rows. `indptr[i]..indptr[i + 1]` spans the non-zero
/// entries of row `i` in `indices`/`data`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsrMatrix {
    pub data: Vec<f64>,
    pub indices: Vec<i32>,
    pub indptr: Vec<i32>,
}

impl CsrMatrix {
    /// Observation-major encoding (rows are features).
    pub fn by_feature(table: &ProfileMatrix) -> Self {
        let rows: Vec<&[f64]> = table.rows().map(|(_, row)| row).collect();
        Self::encode(rows.len(), table.n_samples(), |r, c| rows[r][c])
    }

    /// Sample-major encoding (rows are samples).
    pub fn by_sample(table: &ProfileMatrix) -> Self {
        let rows: Vec<&[f64]> = table.rows().map(|(_, row)| row).collect();
        Self::encode(table.n_samples(), rows.len(), |s, f| rows[f][s])
    }

    fn encode<F: Fn(usize, usize) -> f64>(n_rows: usize, n_cols: usize, cell: F) -> Self {
        let mut csr = CsrMatrix {
            indptr: Vec::with_capacity(n_rows + 1),
            ..Default::default()
        };
        csr.indptr.push(0);
        for r in 0..n_rows {
            for c in 0..n_cols {
                let v = cell(r, c);
                if v != 0.0 {
                    csr.data.push(v);
                    csr.indices.push(c as i32);
                }
            }
            csr.indptr.push(csr.data.len() as i32);
        }
        csr
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }
}

/// Expands a compressed sparse row encoding into dense rows, rejecting an
/// encoding whose pointers or indices fall outside its arrays.
pub fn dense_from_csr(
    n_rows: usize,
    n_cols: usize,
    data: &[f64],
    indices: &[i32],
    indptr: &[i32],
) -> std::result::Result<Vec<Vec<f64>>, String> {
    if indptr.len() != n_rows + 1 {
        return Err(format!("indptr has {} entries for {} rows", indptr.len(), n_rows));
    }
    if data.len() != indices.len() {
        return Err(format!("{} values but {} indices", data.len(), indices.len()));
    }
    let mut values = vec![vec![0.0; n_cols]; n_rows];
    let mut prev = 0usize;
    for (r, span) in indptr.windows(2).enumerate() {
        let start = usize::try_from(span[0]).map_err(|_| format!("negative indptr {}", span[0]))?;
        let end = usize::try_from(span[1]).map_err(|_| format!("negative indptr {}", span[1]))?;
        if start < prev || end < start || end > indices.len() {
            return Err(format!("indptr span {}..{} of row {} is out of order or out of range", start, end, r));
        }
        for k in start..end {
            let c = usize::try_from(indices[k])
                .ok()
                .filter(|c| *c < n_cols)
                .ok_or_else(|| format!("column index {} out of range", indices[k]))?;
            values[r][c] = data[k];
        }
        prev = end;
    }
    Ok(values)
}

#[derive(Debug, Serialize, Deserialize)]
struct BiomEntry {
    id: String,
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BiomJson {
    id: Option<String>,
    format: String,
    format_url: String,
    #[serde(rename = "type")]
    table_type: String,
    generated_by: String,
    date: String,
    matrix_type: String,
    matrix_element_type: String,
    shape: [usize; 2],
    data: Vec<(usize, usize, f64)>,
    rows: Vec<BiomEntry>,
    columns: Vec<BiomEntry>,
}

fn creation_date() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Writes `table` as a BIOM file at `path`.
///
/// The table is written to a temporary file next to `path` and moved into
/// place only once complete, so a failed call leaves no partial output.
/// Fails with [`ProfileError::Write`] when `path` is a directory or its
/// directory is not writable.
pub fn write_biom<P: AsRef<Path>>(
    filepath: P,
    table: &ProfileMatrix,
    format: BiomFormat,
    options: &BiomOptions,
) -> Result<()> {
    let path = filepath.as_ref();
    write_atomically(path, |tmp| match format {
        BiomFormat::Json => write_json(tmp.as_file_mut(), path, table, options),
        #[cfg(feature = "hdf5")]
        BiomFormat::Hdf5 => h5::write(tmp.path(), table, options).map_err(|source| ProfileError::Hdf5 {
            path: path.to_path_buf(),
            source,
        }),
    })?;
    log::info!(
        "Wrote BIOM table of {} features x {} samples to {}",
        table.n_features(),
        table.n_samples(),
        path.display()
    );
    Ok(())
}

fn write_json<W: Write>(out: W, path: &Path, table: &ProfileMatrix, options: &BiomOptions) -> Result<()> {
    let mut data = Vec::with_capacity(table.nnz());
    for (r, (_, row)) in table.rows().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            if v != 0.0 {
                data.push((r, c, v));
            }
        }
    }
    let entries = |ids: &[String]| -> Vec<BiomEntry> {
        ids.iter()
            .map(|id| BiomEntry { id: id.clone(), metadata: None })
            .collect()
    };

    let doc = BiomJson {
        id: Some(options.table_id.clone()),
        format: BIOM_JSON_FORMAT.to_string(),
        format_url: BIOM_FORMAT_URL.to_string(),
        table_type: options.table_type.clone(),
        generated_by: options.generated_by.clone(),
        date: creation_date(),
        matrix_type: "sparse".to_string(),
        matrix_element_type: "float".to_string(),
        shape: [table.n_features(), table.n_samples()],
        data,
        rows: entries(table.features()),
        columns: entries(table.samples()),
    };

    let mut writer = BufWriter::new(out);
    serde_json::to_writer(&mut writer, &doc).map_err(|source| ProfileError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| ProfileError::write(path, e))
}

/// Loads a sparse BIOM 1.0 JSON table.
pub fn read_biom_json<P: AsRef<Path>>(filepath: P) -> Result<ProfileMatrix> {
    let path = filepath.as_ref();
    let reader = open_text(path)?;
    let doc: BiomJson = serde_json::from_reader(reader).map_err(|source| ProfileError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let features: Vec<String> = doc.rows.into_iter().map(|e| e.id).collect();
    let samples: Vec<String> = doc.columns.into_iter().map(|e| e.id).collect();
    if doc.shape != [features.len(), samples.len()] {
        return Err(ProfileError::parse(
            path,
            1,
            "",
            format!(
                "shape {:?} does not match {} rows x {} columns",
                doc.shape,
                features.len(),
                samples.len()
            ),
        ));
    }

    let mut values = vec![vec![0.0; samples.len()]; features.len()];
    for (r, c, v) in doc.data {
        if r >= features.len() || c >= samples.len() {
            return Err(ProfileError::parse(path, 1, "", format!("entry ({r}, {c}) outside the table")));
        }
        values[r][c] = v;
    }
    Ok(ProfileMatrix::from_rows(features, samples, values))
}

/// Loads a BIOM 2.1 HDF5 table.
#[cfg(feature = "hdf5")]
pub fn read_biom_hdf5<P: AsRef<Path>>(filepath: P) -> Result<ProfileMatrix> {
    let path = filepath.as_ref();
    h5::read(path).map_err(|source| ProfileError::Hdf5 {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(feature = "hdf5")]
mod h5 {
    use hdf5::types::VarLenUnicode;
    use hdf5::{File, Group};
    use std::path::Path;

    use super::{creation_date, dense_from_csr, CsrMatrix, BIOM_FORMAT_URL};
    use crate::config::BiomOptions;
    use crate::profile::ProfileMatrix;

    fn unicode(value: &str) -> hdf5::Result<VarLenUnicode> {
        value
            .parse::<VarLenUnicode>()
            .map_err(|e| hdf5::Error::from(e.to_string()))
    }

    fn str_attr(file: &File, name: &str, value: &str) -> hdf5::Result<()> {
        file.new_attr::<VarLenUnicode>()
            .shape(())
            .create(name)?
            .write_scalar(&unicode(value)?)
    }

    fn write_axis(parent: &Group, ids: &[String], matrix: &CsrMatrix) -> hdf5::Result<()> {
        let ids = ids.iter().map(|id| unicode(id)).collect::<hdf5::Result<Vec<_>>>()?;
        parent.new_dataset_builder().with_data(ids.as_slice()).create("ids")?;
        parent.create_group("metadata")?;
        parent.create_group("group-metadata")?;

        let m = parent.create_group("matrix")?;
        m.new_dataset_builder().with_data(matrix.data.as_slice()).create("data")?;
        m.new_dataset_builder().with_data(matrix.indices.as_slice()).create("indices")?;
        m.new_dataset_builder().with_data(matrix.indptr.as_slice()).create("indptr")?;
        Ok(())
    }

    pub(super) fn write(path: &Path, table: &ProfileMatrix, options: &BiomOptions) -> hdf5::Result<()> {
        let file = File::create(path)?;
        let by_feature = CsrMatrix::by_feature(table);
        let by_sample = CsrMatrix::by_sample(table);

        str_attr(&file, "id", &options.table_id)?;
        str_attr(&file, "type", &options.table_type)?;
        str_attr(&file, "format-url", BIOM_FORMAT_URL)?;
        str_attr(&file, "generated-by", &options.generated_by)?;
        str_attr(&file, "creation-date", &creation_date())?;
        file.new_attr_builder()
            .with_data(&[2i32, 1][..])
            .create("format-version")?;
        file.new_attr_builder()
            .with_data(&[table.n_features() as i32, table.n_samples() as i32][..])
            .create("shape")?;
        file.new_attr::<i64>()
            .shape(())
            .create("nnz")?
            .write_scalar(&(by_feature.nnz() as i64))?;

        write_axis(&file.create_group("observation")?, table.features(), &by_feature)?;
        write_axis(&file.create_group("sample")?, table.samples(), &by_sample)?;
        file.close()
    }

    fn read_ids(file: &File, name: &str) -> hdf5::Result<Vec<String>> {
        Ok(file
            .dataset(name)?
            .read_1d::<VarLenUnicode>()?
            .into_iter()
            .map(|v| v.as_str().to_owned())
            .collect())
    }

    pub(super) fn read(path: &Path) -> hdf5::Result<ProfileMatrix> {
        let file = File::open(path)?;
        let features = read_ids(&file, "observation/ids")?;
        let samples = read_ids(&file, "sample/ids")?;
        let data = file.dataset("observation/matrix/data")?.read_raw::<f64>()?;
        let indices = file.dataset("observation/matrix/indices")?.read_raw::<i32>()?;
        let indptr = file.dataset("observation/matrix/indptr")?.read_raw::<i32>()?;

        let values = dense_from_csr(features.len(), samples.len(), &data, &indices, &indptr)
            .map_err(hdf5::Error::from)?;
        Ok(ProfileMatrix::from_rows(features, samples, values))
    }
}
