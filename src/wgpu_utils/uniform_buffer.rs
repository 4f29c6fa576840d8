// src/wgpu_utils/uniform_buffer.rs - Typed uniform, storage array and dynamic-offset buffers
use std::marker::PhantomData;

fn short_type_name<T>() -> &'static str {
    let type_name = std::any::type_name::<T>();
    let pos = type_name.rfind(':').unwrap_or(0);
    if pos > 0 {
        &type_name[(pos + 1)..]
    } else {
        type_name
    }
}

fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Single-value uniform buffer
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Create a new uniform buffer
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", short_type_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: Vec::new(),
        }
    }

    /// Update buffer content (skips the write when nothing changed)
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    /// Get binding resource
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}

/// Read-only storage buffer holding a runtime-sized array
///
/// Never shrinks; [`ArrayBuffer::ensure_capacity`] reallocates when the
/// array outgrows it. A zero-length array still gets one element so the
/// buffer can be bound.
pub struct ArrayBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    capacity: usize,
    current_size: usize,
}

impl<Content: bytemuck::Pod> ArrayBuffer<Content> {
    fn allocate(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("ArrayBuffer<{}>", short_type_name::<Content>())),
            size: (capacity.max(1) * std::mem::size_of::<Content>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Create new array buffer with given capacity
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        ArrayBuffer {
            buffer: Self::allocate(device, capacity),
            content_type: PhantomData,
            capacity: capacity.max(1),
            current_size: 0,
        }
    }

    /// Grows the buffer to hold `len` elements. Returns true if it was reallocated,
    /// in which case bind groups referring to it must be rebuilt.
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, len: usize) -> bool {
        if len <= self.capacity {
            return false;
        }
        let capacity = len.next_power_of_two();
        self.buffer = Self::allocate(device, capacity);
        self.capacity = capacity;
        true
    }

    /// Update array data
    pub fn update_data(&mut self, queue: &wgpu::Queue, data: &[Content]) {
        assert!(data.len() <= self.capacity, "Data exceeds buffer capacity");
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.current_size = data.len();
    }

    /// Get binding resource
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    /// Get current number of elements
    pub fn len(&self) -> usize {
        self.current_size
    }

    pub fn is_empty(&self) -> bool {
        self.current_size == 0
    }

    /// Get capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Uniform buffer holding one `Content` per draw, addressed by dynamic offset
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    stride: u64,
    capacity: usize,
    staging: Vec<u8>,
}

impl<Content: bytemuck::Pod> DynamicUniformBuffer<Content> {
    fn allocate(device: &wgpu::Device, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("DynamicUniformBuffer<{}>", short_type_name::<Content>())),
            size: stride * capacity.max(1) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_to(std::mem::size_of::<Content>() as u64, alignment);
        DynamicUniformBuffer {
            buffer: Self::allocate(device, stride, capacity),
            content_type: PhantomData,
            stride,
            capacity: capacity.max(1),
            staging: Vec::new(),
        }
    }

    /// Uploads `items`, one per stride. Returns true if the buffer was reallocated.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[Content]) -> bool {
        let grown = items.len() > self.capacity;
        if grown {
            self.capacity = items.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.stride, self.capacity);
        }
        if items.is_empty() {
            return grown;
        }

        self.staging.clear();
        self.staging.resize(self.stride as usize * items.len(), 0);
        for (slot, item) in self.staging.chunks_exact_mut(self.stride as usize).zip(items) {
            slot[..std::mem::size_of::<Content>()].copy_from_slice(bytemuck::bytes_of(item));
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
        grown
    }

    /// Dynamic offset of the `index`th item.
    pub fn offset(&self, index: usize) -> wgpu::DynamicOffset {
        (self.stride * index as u64) as wgpu::DynamicOffset
    }

    /// Binding covering a single item, for use with dynamic offsets.
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<Content>() as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(112, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<std::string::String>(), "String");
    }
}
