//! Python Bindings
//!
//! Exposes atoms to Python as `Atom`, `ReadonlyAtom`, `Setter` and
//! `Subscription`, plus the `get` and `readonly_atom` functions.
//! Values are arbitrary Python objects compared by identity, so setting an
//! atom to the object it already holds notifies nobody.

use std::sync::Arc;

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyList;
use tracing::warn;

use crate::reactive::{Atom, ReadonlyAtom, Subscription};

/// A Python object shared without holding the GIL.
#[derive(Clone)]
struct PyValue(Arc<Py<PyAny>>);

impl PyValue {
    fn new(value: PyObject) -> Self {
        Self(Arc::new(value))
    }

    fn to_py(&self, py: Python<'_>) -> PyObject {
        self.0.clone_ref(py)
    }
}

impl PartialEq for PyValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ptr() == other.0.as_ptr()
    }
}

/// Call `callback` with `value`, reporting rather than propagating errors.
fn call_python(py: Python<'_>, callback: &PyObject, value: &PyValue) -> Option<PyObject> {
    match callback.call1(py, (value.to_py(py),)) {
        Ok(result) => Some(result),
        Err(err) => {
            warn!("python callback raised");
            err.print(py);
            None
        }
    }
}

fn python_sink(callback: PyObject) -> impl Fn(&PyValue) + Send + Sync + 'static {
    move |value: &PyValue| {
        Python::with_gil(|py| {
            call_python(py, &callback, value);
        });
    }
}

fn python_map(f: PyObject) -> impl Fn(&PyValue) -> PyValue + Send + Sync + 'static {
    move |value: &PyValue| {
        Python::with_gil(|py| {
            let result = call_python(py, &f, value).unwrap_or_else(|| py.None());
            PyValue::new(result)
        })
    }
}

/// Python-exposed writable atom.
#[pyclass(name = "Atom")]
pub struct PyAtom {
    atom: Atom<PyValue>,
}

#[pymethods]
impl PyAtom {
    #[new]
    fn new(value: PyObject) -> Self {
        Self {
            atom: Atom::new(PyValue::new(value)),
        }
    }

    fn get(&self, py: Python<'_>) -> PyObject {
        self.atom.get().to_py(py)
    }

    /// Returns whether subscribers were notified.
    fn set(&self, value: PyObject) -> bool {
        self.atom.set(PyValue::new(value))
    }

    fn update(&self, py: Python<'_>, f: PyObject) -> PyResult<bool> {
        let current = self.atom.get();
        let next = f.call1(py, (current.to_py(py),))?;
        Ok(self.atom.set(PyValue::new(next)))
    }

    fn subscribe(&self, callback: PyObject) -> PySubscription {
        PySubscription::new(self.atom.subscribe(python_sink(callback)))
    }

    fn map(&self, f: PyObject) -> PyReadonlyAtom {
        PyReadonlyAtom {
            atom: self.atom.map(python_map(f)),
        }
    }

    fn readonly(&self) -> PyReadonlyAtom {
        PyReadonlyAtom {
            atom: self.atom.readonly(),
        }
    }

    #[getter]
    fn id(&self) -> u64 {
        self.atom.id()
    }

    fn subscriber_count(&self) -> usize {
        self.atom.subscriber_count()
    }

    fn __repr__(&self, py: Python<'_>) -> String {
        repr("Atom", py, &self.atom.get(), self.atom.subscriber_count())
    }
}

/// Python-exposed readonly atom. Has no `set`.
#[pyclass(name = "ReadonlyAtom")]
pub struct PyReadonlyAtom {
    atom: ReadonlyAtom<PyValue>,
}

#[pymethods]
impl PyReadonlyAtom {
    fn get(&self, py: Python<'_>) -> PyObject {
        self.atom.get().to_py(py)
    }

    fn subscribe(&self, callback: PyObject) -> PySubscription {
        PySubscription::new(self.atom.subscribe(python_sink(callback)))
    }

    fn map(&self, f: PyObject) -> PyReadonlyAtom {
        PyReadonlyAtom {
            atom: self.atom.map(python_map(f)),
        }
    }

    fn readonly(&self) -> PyReadonlyAtom {
        PyReadonlyAtom {
            atom: self.atom.readonly(),
        }
    }

    #[getter]
    fn id(&self) -> u64 {
        self.atom.id()
    }

    fn subscriber_count(&self) -> usize {
        self.atom.subscriber_count()
    }

    fn __repr__(&self, py: Python<'_>) -> String {
        repr("ReadonlyAtom", py, &self.atom.get(), self.atom.subscriber_count())
    }
}

/// Python-exposed write half of `readonly_atom`.
#[pyclass(name = "Setter")]
pub struct PySetter {
    atom: Atom<PyValue>,
}

#[pymethods]
impl PySetter {
    /// Returns whether subscribers were notified.
    fn __call__(&self, value: PyObject) -> bool {
        self.atom.set(PyValue::new(value))
    }
}

/// Python-level `readonly_atom(value)`: returns `(view, setter)`.
#[pyfunction]
#[pyo3(name = "readonly_atom")]
fn py_readonly_atom(value: PyObject) -> (PyReadonlyAtom, PySetter) {
    let atom = Atom::new(PyValue::new(value));
    let view = PyReadonlyAtom {
        atom: atom.readonly(),
    };
    (view, PySetter { atom })
}

/// Python-exposed subscription handle.
#[pyclass(name = "Subscription")]
pub struct PySubscription {
    inner: Option<Subscription>,
}

impl PySubscription {
    fn new(subscription: Subscription) -> Self {
        Self {
            inner: Some(subscription),
        }
    }
}

#[pymethods]
impl PySubscription {
    /// Deregister the callback. Calling this twice is a no-op.
    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.inner.take() {
            subscription.unsubscribe();
        }
    }

    #[getter]
    fn closed(&self) -> bool {
        self.inner.as_ref().map_or(true, Subscription::is_closed)
    }
}

/// Python-level `get(obj)`: uses `get_value`, then `get`, then `subscribe`.
#[pyfunction]
#[pyo3(name = "get")]
fn py_get(py: Python<'_>, obj: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    if obj.hasattr("get_value")? {
        return obj.call_method0("get_value").map(Bound::unbind);
    }
    if obj.hasattr("get")? {
        return obj.call_method0("get").map(Bound::unbind);
    }

    let values = PyList::empty_bound(py);
    let subscription = obj.call_method1("subscribe", (values.getattr("append")?,))?;
    subscription.call_method0("unsubscribe")?;

    match values.len() {
        0 => Err(PyRuntimeError::new_err(crate::Error::NotSynchronous.to_string())),
        n => values.get_item(n - 1).map(Bound::unbind),
    }
}

fn repr(kind: &str, py: Python<'_>, value: &PyValue, subscribers: usize) -> String {
    let repr = value
        .0
        .bind(py)
        .repr()
        .map(|r| r.to_string())
        .unwrap_or_else(|_| "?".to_string());
    format!("{kind}(value={repr}, subscribers={subscribers})")
}

/// Register the Python classes on `m`.
pub(crate) fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAtom>()?;
    m.add_class::<PyReadonlyAtom>()?;
    m.add_class::<PySetter>()?;
    m.add_class::<PySubscription>()?;
    m.add_function(wrap_pyfunction!(py_get, m)?)?;
    m.add_function(wrap_pyfunction!(py_readonly_atom, m)?)?;
    Ok(())
}
