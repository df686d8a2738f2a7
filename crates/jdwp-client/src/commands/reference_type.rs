//! The ReferenceType command set (2)

use crate::codec::{DecodeJdwpDataError, JdwpDecodable, JdwpDecoder};
use crate::commands::command;
use jdwp_types::{
    Byte, ClassLoaderId, ClassObjectId, ClassStatus, FieldId, Int, InterfaceId, MethodId,
    ReferenceTypeId, TaggedObjectId, TypeTag, Value,
};

command! {
    command_set: ReferenceType = 2;
    command: 1;
    /// Returns the JNI signature of a reference type
    #[derive(Debug)]
    pub struct Signature {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub signature: String
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 2;
    /// Returns the instance of java.lang.ClassLoader which loaded the given reference type
    #[derive(Debug)]
    pub struct ClassLoader {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub class_loader: ClassLoaderId
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 3;
    /// Returns the modifiers (also known as access flags) of a reference type
    #[derive(Debug)]
    pub struct Modifiers {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub mod_bits: Int
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 4;
    /// Returns information for each field declared directly in this type, not including
    /// inherited or superinterface members
    #[derive(Debug)]
    pub struct Fields {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub declared: Vec<FieldDeclaration>
    }
}

/// A declared field, as listed by [Fields]
#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub field_id: FieldId,
    pub name: String,
    pub signature: String,
    pub mod_bits: Int,
}

impl JdwpDecodable for FieldDeclaration {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            field_id: decoder.get()?,
            name: decoder.get()?,
            signature: decoder.get()?,
            mod_bits: decoder.get()?,
        })
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 5;
    /// Returns information for each method declared directly in this type
    #[derive(Debug)]
    pub struct Methods {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub declared: Vec<MethodDeclaration>
    }
}

/// A declared method, as listed by [Methods]
#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    pub method_id: MethodId,
    pub name: String,
    pub signature: String,
    pub mod_bits: Int,
}

impl JdwpDecodable for MethodDeclaration {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            method_id: decoder.get()?,
            name: decoder.get()?,
            signature: decoder.get()?,
            mod_bits: decoder.get()?,
        })
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 6;
    /// Returns the value of one or more static fields of the reference type
    #[derive(Debug)]
    pub struct GetValues {
        pub ref_type: ReferenceTypeId,
        pub fields: Vec<FieldId>,
    } -> {
        pub values: Vec<Value>
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 7;
    /// Returns the name of the source file in which a reference type was declared
    #[derive(Debug)]
    pub struct SourceFile {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub source_file: String
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 8;
    /// Returns the classes and interfaces directly nested within this type
    #[derive(Debug)]
    pub struct NestedTypes {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub classes: Vec<TaggedTypeRef>
    }
}

/// A `{refTypeTag, typeID}` pair
#[derive(Debug, Clone, Copy)]
pub struct TaggedTypeRef {
    pub ref_type_tag: TypeTag,
    pub type_id: ReferenceTypeId,
}

impl JdwpDecodable for TaggedTypeRef {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            ref_type_tag: decoder.get()?,
            type_id: decoder.get()?,
        })
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 9;
    /// Returns the current status of the reference type
    #[derive(Debug)]
    pub struct Status {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub status: ClassStatus
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 10;
    /// Returns the interfaces declared as implemented by this class
    #[derive(Debug)]
    pub struct Interfaces {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub interfaces: Vec<InterfaceId>
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 11;
    /// Returns the class object corresponding to this type
    #[derive(Debug)]
    pub struct ClassObject {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub class_object: ClassObjectId
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 12;
    /// Returns the value of the SourceDebugExtension attribute
    #[derive(Debug)]
    pub struct SourceDebugExtension {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub extension: String
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 13;
    /// Returns the JNI signature of a reference type along with the generic signature if there
    /// is one
    #[derive(Debug)]
    pub struct SignatureWithGeneric {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub signature: String,
        pub generic_signature: String,
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 14;
    /// Like [Fields], with generic signatures
    #[derive(Debug)]
    pub struct FieldsWithGeneric {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub declared: Vec<GenericFieldDeclaration>
    }
}

/// A declared field with its generic signature
#[derive(Debug, Clone)]
pub struct GenericFieldDeclaration {
    pub field_id: FieldId,
    pub name: String,
    pub signature: String,
    pub generic_signature: String,
    pub mod_bits: Int,
}

impl JdwpDecodable for GenericFieldDeclaration {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            field_id: decoder.get()?,
            name: decoder.get()?,
            signature: decoder.get()?,
            generic_signature: decoder.get()?,
            mod_bits: decoder.get()?,
        })
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 15;
    /// Like [Methods], with generic signatures
    #[derive(Debug)]
    pub struct MethodsWithGeneric {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub declared: Vec<GenericMethodDeclaration>
    }
}

/// A declared method with its generic signature
#[derive(Debug, Clone)]
pub struct GenericMethodDeclaration {
    pub method_id: MethodId,
    pub name: String,
    pub signature: String,
    pub generic_signature: String,
    pub mod_bits: Int,
}

impl JdwpDecodable for GenericMethodDeclaration {
    type Err = DecodeJdwpDataError;

    fn decode(decoder: &mut JdwpDecoder) -> Result<Self, Self::Err> {
        Ok(Self {
            method_id: decoder.get()?,
            name: decoder.get()?,
            signature: decoder.get()?,
            generic_signature: decoder.get()?,
            mod_bits: decoder.get()?,
        })
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 16;
    /// Returns up to `max_instances` reachable instances of this reference type
    #[derive(Debug)]
    pub struct Instances {
        pub ref_type: ReferenceTypeId,
        pub max_instances: Int,
    } -> {
        pub instances: Vec<TaggedObjectId>
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 17;
    /// Returns the class file major and minor version numbers
    #[derive(Debug)]
    pub struct ClassFileVersion {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub major_version: Int,
        pub minor_version: Int,
    }
}

command! {
    command_set: ReferenceType = 2;
    command: 18;
    /// Returns the raw bytes of the constant pool
    #[derive(Debug)]
    pub struct ConstantPool {
        pub ref_type: ReferenceTypeId,
    } -> {
        pub count: Int,
        pub bytes: Vec<Byte>,
    }
}
