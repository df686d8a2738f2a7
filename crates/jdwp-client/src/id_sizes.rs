//! Id sizes, negotiated with the VM at startup

/// The byte widths the target VM uses for its opaque ids.
///
/// Fetched with `VirtualMachine.IDSizes` right after the handshake; until then every width
/// defaults to 8, which is what modern ART answers anyway.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdSizes {
    field_id_size: usize,
    method_id_size: usize,
    object_id_size: usize,
    reference_type_id_size: usize,
    frame_id_size: usize,
}

impl IdSizes {
    /// Creates a new id sizes object
    pub fn new(
        field_id_size: usize,
        method_id_size: usize,
        object_id_size: usize,
        reference_type_id_size: usize,
        frame_id_size: usize,
    ) -> Self {
        Self {
            field_id_size,
            method_id_size,
            object_id_size,
            reference_type_id_size,
            frame_id_size,
        }
    }

    /// Gets the size (in bytes) of field ids
    pub fn field_id_size(&self) -> usize {
        self.field_id_size
    }

    /// Gets the size (in bytes) of method ids
    pub fn method_id_size(&self) -> usize {
        self.method_id_size
    }

    /// Gets the size (in bytes) of object ids
    pub fn object_id_size(&self) -> usize {
        self.object_id_size
    }

    /// Gets the size (in bytes) of reference type ids
    pub fn reference_type_id_size(&self) -> usize {
        self.reference_type_id_size
    }

    /// Gets the size (in bytes) of frame ids
    pub fn frame_id_size(&self) -> usize {
        self.frame_id_size
    }
}

impl Default for IdSizes {
    fn default() -> Self {
        Self {
            field_id_size: 8,
            method_id_size: 8,
            object_id_size: 8,
            reference_type_id_size: 8,
            frame_id_size: 8,
        }
    }
}
