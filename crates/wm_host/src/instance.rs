use alloc::format;
use alloc::string::{String, ToString};
use core::cell::RefCell;

use wasmtime::{Engine, Instance, Memory, Module, Store, TypedFunc, WasmParams, WasmResults};
use wm_ptr::{GuestRuntime, RuntimeError};

use crate::HostError;

impl From<wasmtime::Error> for HostError {
    fn from(err: wasmtime::Error) -> Self {
        HostError::Runtime(format!("{err:#}"))
    }
}

// -----------------------------------------------------------------------------
// GuestExports

/// Names of the exports a guest must provide.
///
/// The defaults match a C module built with `malloc` and `free` exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestExports {
    pub memory: String,
    pub allocate: String,
    pub release: String,
}

impl Default for GuestExports {
    fn default() -> Self {
        Self {
            memory: "memory".to_string(),
            allocate: "malloc".to_string(),
            release: "free".to_string(),
        }
    }
}

// -----------------------------------------------------------------------------
// WasmtimeGuest

/// A [`GuestRuntime`] backed by an instantiated wasmtime module.
///
/// The store sits in a `RefCell`, so handles can share the guest by reference
/// while [`call`](Self::call) still reaches the store mutably. Calls must not
/// be nested inside [`with_store`](Self::with_store).
pub struct WasmtimeGuest<T: 'static> {
    store: RefCell<Store<T>>,
    instance: Instance,
    memory: Memory,
    malloc: TypedFunc<i32, i32>,
    free: TypedFunc<i32, ()>,
}

impl<T: 'static> WasmtimeGuest<T> {
    /// Bind the memory and allocator exports of `instance`.
    pub fn new(
        mut store: Store<T>,
        instance: Instance,
        exports: &GuestExports,
    ) -> Result<Self, HostError> {
        let memory = instance
            .get_memory(&mut store, &exports.memory)
            .ok_or_else(|| HostError::MissingExport(exports.memory.clone()))?;
        let malloc = instance
            .get_typed_func::<i32, i32>(&mut store, &exports.allocate)
            .map_err(|_| HostError::MissingExport(exports.allocate.clone()))?;
        let free = instance
            .get_typed_func::<i32, ()>(&mut store, &exports.release)
            .map_err(|_| HostError::MissingExport(exports.release.clone()))?;

        Ok(Self {
            store: RefCell::new(store),
            instance,
            memory,
            malloc,
            free,
        })
    }

    /// Instantiate a module without imports and bind the default exports.
    pub fn instantiate(engine: &Engine, module: &Module, data: T) -> Result<Self, HostError> {
        let mut store = Store::new(engine, data);
        let instance = Instance::new(&mut store, module, &[])?;
        Self::new(store, instance, &GuestExports::default())
    }

    /// Call the typed export `name`, usually with handle addresses as
    /// arguments.
    pub fn call<Params, Results>(&self, name: &str, params: Params) -> Result<Results, HostError>
    where
        Params: WasmParams,
        Results: WasmResults,
    {
        let mut store = self.store.borrow_mut();
        let func = self
            .instance
            .get_typed_func::<Params, Results>(&mut *store, name)
            .map_err(|_| HostError::MissingExport(name.to_string()))?;
        Ok(func.call(&mut *store, params)?)
    }

    /// Run `f` with exclusive access to the store.
    pub fn with_store<U>(&self, f: impl FnOnce(&mut Store<T>) -> U) -> U {
        f(&mut self.store.borrow_mut())
    }

    #[inline]
    pub fn instance(&self) -> Instance {
        self.instance
    }

    /// Current size of the guest's linear memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.data_size(&*self.store.borrow())
    }
}

impl<T: 'static> GuestRuntime for WasmtimeGuest<T> {
    fn allocate(&self, size: usize) -> Result<u32, RuntimeError> {
        let len = i32::try_from(size).map_err(|_| RuntimeError::AllocationFailed { size })?;
        let address = self
            .malloc
            .call(&mut *self.store.borrow_mut(), len)
            .map_err(|err| RuntimeError::Guest(format!("{err:#}")))?;
        match address {
            0 => Err(RuntimeError::AllocationFailed { size }),
            address => Ok(address as u32),
        }
    }

    fn release(&self, address: u32) {
        if let Err(err) = self
            .free
            .call(&mut *self.store.borrow_mut(), address as i32)
        {
            log::error!("guest free({address}) trapped: {err:#}");
        }
    }

    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> Result<(), RuntimeError> {
        self.memory
            .read(&*self.store.borrow(), address as usize, buf)
            .map_err(|_| RuntimeError::AccessOutOfRange {
                address,
                len: buf.len(),
            })
    }

    fn write_bytes(&self, address: u32, bytes: &[u8]) -> Result<(), RuntimeError> {
        self.memory
            .write(&mut *self.store.borrow_mut(), address as usize, bytes)
            .map_err(|_| RuntimeError::AccessOutOfRange {
                address,
                len: bytes.len(),
            })
    }

    fn decode_utf8(&self, address: u32) -> Result<String, RuntimeError> {
        let store = self.store.borrow();
        let data = self.memory.data(&*store);
        let tail = data.get(address as usize..).unwrap_or_default();
        let end = tail
            .iter()
            .position(|byte| *byte == 0)
            .ok_or(RuntimeError::AccessOutOfRange {
                address,
                len: tail.len() + 1,
            })?;
        Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
    }
}
