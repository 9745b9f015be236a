use std::collections::BTreeMap;

use hdf5::types::TypeDescriptor;
use ndarray::{Array, Array1, ArrayD, Dimension, IxDyn};
use tracing::debug;

use crate::quantity::canonicalize;
use crate::store::attrs::{leaf_name, read_string_attr_opt, write_string_attr};
use crate::units::UnitClass;
use crate::Error;

const UNIT_ATTR: &str = "unit";

/// Numeric content of one stored dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum Values {
    Float(ArrayD<f64>),
    Int(ArrayD<i64>),
}

impl Values {
    /// Total number of elements.
    pub fn len(&self) -> usize {
        match self {
            Values::Float(values) => values.len(),
            Values::Int(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Values::Float(values) => values.shape(),
            Values::Int(values) => values.shape(),
        }
    }

    /// The values as a flat float array in storage order.
    pub fn to_f64(&self) -> Array1<f64> {
        match self {
            Values::Float(values) => values.iter().copied().collect(),
            Values::Int(values) => values.iter().map(|&value| value as f64).collect(),
        }
    }

    /// The values as a flat integer array; floats are rounded.
    pub fn to_i64(&self) -> Array1<i64> {
        match self {
            Values::Float(values) => values.iter().map(|value| value.round() as i64).collect(),
            Values::Int(values) => values.iter().copied().collect(),
        }
    }
}

/// A dataset together with its `unit` attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub values: Values,
    pub unit: Option<String>,
}

impl Column {
    /// Flat values converted to SI.
    ///
    /// The stored `unit` attribute decides the conversion; columns written
    /// without one follow the storage convention of their quantity.
    pub fn to_si(&self, key: &str) -> Array1<f64> {
        let class = match &self.unit {
            Some(unit) => UnitClass::from_stored_unit(unit),
            None => UnitClass::stored_default(key),
        };
        class.to_si(self.values.to_f64())
    }
}

/// Named numeric datasets making up the body of a group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    columns: BTreeMap<String, Column>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a float dataset of any dimension.
    pub fn with_floats<D: Dimension>(
        self,
        name: &str,
        values: Array<f64, D>,
        unit: Option<&str>,
    ) -> Self {
        self.with_column(name, Values::Float(values.into_dyn()), unit)
    }

    /// Adds an integer dataset of any dimension.
    pub fn with_ints<D: Dimension>(
        self,
        name: &str,
        values: Array<i64, D>,
        unit: Option<&str>,
    ) -> Self {
        self.with_column(name, Values::Int(values.into_dyn()), unit)
    }

    /// Adds a float scalar, stored as a length-1 array.
    pub fn with_scalar(self, name: &str, value: f64, unit: Option<&str>) -> Self {
        self.with_column(name, Values::Float(ArrayD::from_elem(IxDyn(&[1]), value)), unit)
    }

    /// Adds an integer scalar, stored as a length-1 array.
    pub fn with_int_scalar(self, name: &str, value: i64, unit: Option<&str>) -> Self {
        self.with_column(name, Values::Int(ArrayD::from_elem(IxDyn(&[1]), value)), unit)
    }

    fn with_column(mut self, name: &str, values: Values, unit: Option<&str>) -> Self {
        self.insert(name, Column { values, unit: unit.map(str::to_string) });
        self
    }

    pub fn insert(&mut self, name: &str, column: Column) {
        self.columns.insert(name.to_string(), column);
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Finds the column whose name resolves to the canonical `key`.
    pub fn find(&self, key: &str) -> Option<(&str, &Column)> {
        self.columns
            .iter()
            .find(|(name, _)| canonicalize(name).map_or(false, |canonical| canonical == key))
            .map(|(name, column)| (name.as_str(), column))
    }

    pub fn contains_quantity(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Length shared by every column of a per-marker or per-sample table.
    pub fn row_count(&self, table_name: &str) -> Result<usize, Error> {
        let mut columns = self.columns.iter();
        let expected_length = match columns.next() {
            Some((_, column)) => column.values.len(),
            None => return Ok(0),
        };
        for (name, column) in columns {
            if column.values.len() != expected_length {
                return Err(Error::InconsistentShape {
                    array_name: format!("{}/{}", table_name, name),
                    input_length: column.values.len(),
                    expected_length,
                });
            }
        }
        Ok(expected_length)
    }

    pub(crate) fn write(&self, group: &hdf5::Group) -> Result<(), Error> {
        if let Some(name) = self.names().find(|name| name.is_empty() || name.contains('/')) {
            return Err(Error::Malformed(format!("\"{}\" is not a valid dataset name", name)));
        }
        for (name, column) in &self.columns {
            let dataset = match &column.values {
                Values::Float(values) => {
                    let dataset = group
                        .new_dataset::<f64>()
                        .shape(values.shape().to_vec())
                        .create(name.as_str())?;
                    dataset.write(values.view())?;
                    dataset
                }
                Values::Int(values) => {
                    let dataset = group
                        .new_dataset::<i64>()
                        .shape(values.shape().to_vec())
                        .create(name.as_str())?;
                    dataset.write(values.view())?;
                    dataset
                }
            };
            if let Some(unit) = &column.unit {
                write_string_attr(&dataset, UNIT_ATTR, unit)?;
            }
        }
        Ok(())
    }

    pub(crate) fn read(group: &hdf5::Group) -> Result<Self, Error> {
        let mut payload = Self::new();
        for dataset in group.datasets()? {
            let name = leaf_name(&dataset.name());
            let values = match dataset.dtype()?.to_descriptor()? {
                TypeDescriptor::Float(_) => Values::Float(dataset.read_dyn::<f64>()?),
                TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
                    Values::Int(dataset.read_dyn::<i64>()?)
                }
                other => {
                    debug!(dataset = %name, dtype = ?other, "skipping non-numeric dataset");
                    continue;
                }
            };
            let unit = read_string_attr_opt(&dataset, UNIT_ATTR)?;
            payload.insert(&name, Column { values, unit });
        }
        Ok(payload)
    }
}
