//! constants

use crate::macros::tagged_type;
use bitfield::bitfield;

tagged_type! {
    repr: u16;
    /// An error constant returned in the reply header.
    ///
    /// Only the codes a Dalvik/ART target is known to produce are listed; the 500 block is the
    /// one the frame-slot probing logic depends on.
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum ErrorConstant {
        /// No error has occurred.
        None = 0,
        /// Passed thread is null, is not a valid thread or has exited.
        InvalidThread = 10,
        /// Thread group invalid.
        InvalidThreadGroup = 11,
        /// Invalid priority.
        InvalidPriority = 12,
        /// If the specified thread has not been suspended by an event.
        ThreadNotSuspended = 13,
        /// Thread already suspended.
        ThreadSuspended = 14,
        /// Thread has not been started or is now dead.
        ThreadNotAlive = 15,
        /// If this reference type has been unloaded and garbage collected.
        InvalidObject = 20,
        /// Invalid class.
        InvalidClass = 21,
        /// Class has been loaded but not yet prepared.
        ClassNotPrepared = 22,
        /// Invalid method.
        InvalidMethodId = 23,
        /// Invalid location.
        InvalidLocation = 24,
        /// Invalid field.
        InvalidFieldId = 25,
        /// Invalid jframeID.
        InvalidFrameId = 30,
        /// There are no more Java or JNI frames on the call stack.
        NoMoreFrames = 31,
        /// Information about the frame is not available.
        OpaqueFrame = 32,
        /// Operation can only be performed on current frame.
        NotCurrentFrame = 33,
        /// The variable is not an appropriate type for the function used.
        TypeMismatch = 34,
        /// Invalid slot.
        InvalidSlot = 35,
        /// Item already set.
        Duplicate = 40,
        /// Desired element not found.
        NotFound = 41,
        /// Invalid monitor.
        InvalidMonitor = 50,
        /// This thread doesn't own the monitor.
        NotMonitorOwner = 51,
        /// The call has been interrupted before completion.
        Interrupt = 52,
        /// The virtual machine attempted to read a class file and determined that the file is
        /// malformed or otherwise cannot be interpreted as a class file.
        InvalidClassFormat = 60,
        /// A circularity has been detected while initializing a class.
        CircularClassDefinition = 61,
        /// The verifier detected that a class file, though well formed, contained some sort of
        /// internal inconsistency or security problem.
        FailsVerification = 62,
        /// Adding methods has not been implemented.
        AddMethodNotImplemented = 63,
        /// Schema change has not been implemented.
        SchemaChangeNotImplemented = 64,
        /// The state of the thread has been modified, and is now inconsistent.
        InvalidTypestate = 65,
        /// A direct superclass is different for the new class version.
        HierarchyChangeNotImplemented = 66,
        /// The new class version does not declare a method declared in the old class version.
        DeleteMethodNotImplemented = 67,
        /// A class file has a version number not supported by this VM.
        UnsupportedVersion = 68,
        /// The class name defined in the new class file is different from the name in the old
        /// class object.
        NamesDontMatch = 69,
        /// The new class version has different modifiers.
        ClassModifiersChangeNotImplemented = 70,
        /// A method in the new class version has different modifiers than its counterpart in the
        /// old class version.
        MethodModifiersChangeNotImplemented = 71,
        /// The functionality is not implemented in this virtual machine.
        NotImplemented = 99,
        /// Invalid pointer.
        NullPointer = 100,
        /// Desired information is not available.
        AbsentInformation = 101,
        /// The specified event type id is not recognized.
        InvalidEventType = 102,
        /// Illegal argument.
        IllegalArgument = 103,
        /// The function needed to allocate memory and no more memory was available for allocation.
        OutOfMemory = 110,
        /// Debugging has not been enabled in this virtual machine. JVMTI cannot be used.
        AccessDenied = 111,
        /// The virtual machine is not running.
        VmDead = 112,
        /// An unexpected internal error has occurred.
        Internal = 113,
        /// The thread being used to call this function is not attached to the virtual machine.
        UnattachedThread = 115,
        /// object type id or class tag.
        InvalidTag = 500,
        /// Previous invoke not complete.
        AlreadyInvoking = 502,
        /// Index is invalid.
        InvalidIndex = 503,
        /// The length is invalid.
        InvalidLength = 504,
        /// The string is invalid.
        InvalidString = 506,
        /// The class loader is invalid.
        InvalidClassLoader = 507,
        /// The array is invalid.
        InvalidArray = 508,
        /// Unable to load the transport.
        TransportLoad = 509,
        /// Unable to initialize the transport.
        TransportInit = 510,
        /// The method is native.
        NativeMethod = 511,
        /// The count is invalid.
        InvalidCount = 512,
    }
}

tagged_type! {
    /// A tag for a certain reference type
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum TypeTag {
        /// ReferenceType is a class.
        Class = 1,
        /// ReferenceType is an interface.
        Interface = 2,
        /// Reference type is an array.
        Array = 3
    }
}

tagged_type! {
    /// A tag for a certain type
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum Tag {
        /// '[' - an array object (objectID size).
        Array = 0x5b,
        /// 'B' - a byte value (1 byte).
        Byte = 0x42,
        /// 'C' - a character value (2 bytes).
        Char = 0x43,
        /// 'L' - an object (objectID size).
        Object = 0x4c,
        /// 'F' - a float value (4 bytes).
        Float = 0x46,
        /// 'D' - a double value (8 bytes).
        Double = 0x44,
        /// 'I' - an int value (4 bytes).
        Int = 0x49,
        /// 'J' - a long value (8 bytes).
        Long = 0x4a,
        /// 'S' - a short value (2 bytes).
        Short = 0x53,
        /// 'V' - a void value (no bytes).
        Void = 0x56,
        /// 'Z' - a boolean value (1 byte).
        Boolean = 0x5a,
        /// 's' - a String object (objectID size).
        String = 0x73,
        /// 't' - a Thread object (objectID size).
        Thread = 0x74,
        /// 'g' - a ThreadGroup object (objectID size).
        ThreadGroup = 0x67,
        /// 'l' - a ClassLoader object (objectID size).
        ClassLoader = 0x6c,
        /// 'c' - a class object object (objectID size).
        ClassObject = 0x63,
    }
}

impl Tag {
    /// The number of payload bytes mandated for a value of this tag, assuming 8-byte object ids
    pub const fn width(&self) -> usize {
        match self {
            Tag::Void => 0,
            Tag::Byte | Tag::Boolean => 1,
            Tag::Char | Tag::Short => 2,
            Tag::Int | Tag::Float => 4,
            Tag::Long
            | Tag::Double
            | Tag::Object
            | Tag::Array
            | Tag::String
            | Tag::Thread
            | Tag::ThreadGroup
            | Tag::ClassLoader
            | Tag::ClassObject => 8,
        }
    }

    /// Whether a value of this tag carries an object id rather than a primitive.
    ///
    /// Strings, threads, thread groups, class loaders, class objects and arrays are all
    /// object-kinded for reference purposes.
    pub const fn is_object(&self) -> bool {
        matches!(
            self,
            Tag::Object
                | Tag::Array
                | Tag::String
                | Tag::Thread
                | Tag::ThreadGroup
                | Tag::ClassLoader
                | Tag::ClassObject
        )
    }
}

tagged_type! {
    /// Suspension policy for the event
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum SuspendPolicy {
        /// Nothing in the VM was suspended
        None = 0,
        /// Only the thread where the event started is suspended
        EventThread = 1,
        /// All threads are suspended
        All = 2
    }
}

tagged_type! {
    /// The kind of an event, both in EventRequest.Set and in composite event packets
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum EventKind {
        SingleStep = 1,
        Breakpoint = 2,
        FramePop = 3,
        Exception = 4,
        UserDefined = 5,
        ThreadStart = 6,
        ThreadDeath = 7,
        ClassPrepare = 8,
        ClassUnload = 9,
        ClassLoad = 10,
        FieldAccess = 20,
        FieldModification = 21,
        ExceptionCatch = 30,
        MethodEntry = 40,
        MethodExit = 41,
        MethodExitWithReturnValue = 42,
        MonitorContendedEnter = 43,
        MonitorContendedEntered = 44,
        MonitorWait = 45,
        MonitorWaited = 46,
        VmStart = 90,
        VmDeath = 99,
        /// Never sent across JDWP
        VmDisconnected = 100,
    }
}

tagged_type! {
    /// Granularity of a single step
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum StepSize {
        /// Step by the minimum possible amount, often a single bytecode instruction
        Min = 0,
        /// Step to the next source line (multiple bytecode instructions on Dalvik)
        Line = 1,
    }
}

tagged_type! {
    /// Call-stack relation of a single step
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum StepDepth {
        /// Step into any method calls that occur before the end of the step
        Into = 0,
        /// Step over any method calls that occur before the end of the step
        Over = 1,
        /// Step out of the current method
        Out = 2,
    }
}

tagged_type! {
    /// Discriminator byte of an EventRequest.Set modifier
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub enum ModifierKind {
        Count = 1,
        Conditional = 2,
        ThreadOnly = 3,
        ClassOnly = 4,
        ClassMatch = 5,
        ClassExclude = 6,
        LocationOnly = 7,
        ExceptionOnly = 8,
        FieldOnly = 9,
        Step = 10,
        InstanceOnly = 11,
        SourceNameMatch = 12,
        PlatformThreadsOnly = 13,
    }
}

bitfield! {
    /// The prepare/verify/initialize state of a reference type
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct ClassStatus(u32);
    impl Debug;

    pub verified, _: 0;
    pub prepared, _: 1;
    pub initialized, _: 2;
    pub error, _: 3;
}

impl ClassStatus {
    /// Wraps the raw status bits as sent on the wire
    pub const fn from_bits(bits: u32) -> Self {
        ClassStatus(bits)
    }

    /// The raw status bits
    pub const fn bits(&self) -> u32 {
        self.0
    }
}
