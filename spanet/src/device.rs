use std::fmt;

use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
};

/// Where the generator's session executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda(u32),
}

impl Device {
    /// CUDA always targets device 0; the choice is made once per run.
    pub fn from_flag(cuda: bool) -> Self {
        if cuda { Device::Cuda(0) } else { Device::Cpu }
    }

    pub fn is_cuda(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }

    /// Only the requested provider is registered. A CUDA provider that fails to
    /// register aborts session creation instead of falling back to the CPU.
    pub(crate) fn execution_provider(&self) -> ExecutionProviderDispatch {
        match self {
            Device::Cpu => CPUExecutionProvider::default().build(),
            Device::Cuda(id) => CUDAExecutionProvider::default()
                .with_device_id(*id as i32)
                .build()
                .error_on_failure(),
        }
    }

    /// Human readable adapter name, when the driver can tell us.
    pub fn name(&self) -> Option<String> {
        match self {
            Device::Cpu => None,
            Device::Cuda(id) => cuda_device_name(*id),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "CPU"),
            Device::Cuda(id) => write!(f, "CUDA:{id}"),
        }
    }
}

#[cfg(feature = "cuda")]
fn cuda_device_name(device_id: u32) -> Option<String> {
    use nvml_wrapper::Nvml;
    let nvml = Nvml::init().ok()?;
    let device = nvml.device_by_index(device_id).ok()?;
    device.name().ok()
}

#[cfg(not(feature = "cuda"))]
fn cuda_device_name(_device_id: u32) -> Option<String> {
    None
}
