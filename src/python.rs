use once_cell::sync::Lazy;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};

use crate::{FormatEngine, InsertionSettings, SequenceInserter, Value};

// One engine (and template cache) per interpreter.
static ENGINE: Lazy<FormatEngine> = Lazy::new(FormatEngine::new);

fn to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    if obj.is_instance_of::<PyBool>() {
        return Ok(Value::Bool(obj.extract()?));
    }
    if obj.is_instance_of::<PyInt>() || obj.is_instance_of::<PyFloat>() {
        return Ok(Value::Number(obj.extract::<f64>()?));
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(Value::String(s.to_str()?.to_owned()));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list.iter().map(|item| to_value(&item)).collect::<PyResult<Vec<_>>>().map(Value::Array);
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return tuple.iter().map(|item| to_value(&item)).collect::<PyResult<Vec<_>>>().map(Value::Array);
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut entries = Vec::with_capacity(dict.len());
        for (k, v) in dict.iter() {
            entries.push((k.str()?.to_str()?.to_owned(), to_value(&v)?));
        }
        return Ok(Value::Object(entries));
    }
    if obj.is_callable() {
        let callable: Py<PyAny> = obj.clone().unbind();
        return Ok(Value::lazy(move || {
            Python::with_gil(|py| {
                match callable.call0(py).and_then(|result| to_value(result.bind(py))) {
                    Ok(value) => value,
                    Err(e) => {
                        log::warn!("lazy argument raised {e}; rendering null");
                        Value::Null
                    }
                }
            })
        }));
    }
    Ok(Value::String(obj.str()?.to_str()?.to_owned()))
}

#[pyfunction]
#[pyo3(signature = (fmt, *args))]
fn sprintf(fmt: &str, args: &Bound<'_, PyTuple>) -> PyResult<String> {
    let values = args.iter().map(|a| to_value(&a)).collect::<PyResult<Vec<_>>>()?;
    ENGINE
        .sprintf(fmt, &values)
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pyfunction]
#[pyo3(signature = (fmt, start=0.0, step=1.0, count=1))]
fn insert_numbers(fmt: &str, start: f64, step: f64, count: usize) -> PyResult<Vec<String>> {
    let settings = InsertionSettings {
        format_template: fmt.to_string(),
        start,
        step,
    };
    let sequence = SequenceInserter::new(&ENGINE, &settings).map_err(|e| PyValueError::new_err(e.to_string()))?;
    sequence
        .generate_all(count)
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Returns `(format, start, step)`, or `None` for empty input.
#[pyfunction]
fn parse_override(text: &str) -> PyResult<Option<(String, f64, f64)>> {
    let parsed = crate::parse_override(text).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(parsed.map(|s| (s.format_template, s.start, s.step)))
}

#[pymodule]
fn insertnum(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(sprintf, m)?)?;
    m.add_function(wrap_pyfunction!(insert_numbers, m)?)?;
    m.add_function(wrap_pyfunction!(parse_override, m)?)?;
    Ok(())
}
