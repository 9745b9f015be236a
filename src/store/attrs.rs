use hdf5::types::VarLenUnicode;

use crate::Error;

pub(crate) fn has_attr(location: &hdf5::Location, name: &str) -> Result<bool, Error> {
    Ok(location.attr_names()?.iter().any(|attr_name| attr_name == name))
}

pub(crate) fn read_string_attr(location: &hdf5::Location, name: &str) -> Result<String, Error> {
    let value: VarLenUnicode = location.attr(name)?.read_scalar()?;
    Ok(value.as_str().to_owned())
}

pub(crate) fn read_string_attr_opt(
    location: &hdf5::Location,
    name: &str,
) -> Result<Option<String>, Error> {
    if has_attr(location, name)? {
        read_string_attr(location, name).map(Some)
    } else {
        Ok(None)
    }
}

/// Writes a string attribute, reusing the attribute if it already exists.
pub(crate) fn write_string_attr(
    location: &hdf5::Location,
    name: &str,
    value: &str,
) -> Result<(), Error> {
    let value: VarLenUnicode = value.parse()?;
    let attr = if has_attr(location, name)? {
        location.attr(name)?
    } else {
        location.new_attr::<VarLenUnicode>()
            .shape(hdf5::Extents::Scalar)
            .create(name)?
    };
    attr.write_scalar(&value)?;
    Ok(())
}

/// Final component of an HDF5 path.
pub(crate) fn leaf_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}
