//! Typed wrappers for every JDWP command group.
//!
//! Each command is a struct whose fields are the request body, paired with a generated `*Reply`
//! struct decoded from the reply body. Fire-and-forget commands (the VM writes no reply) have
//! `()` as their reply and return as soon as the packet is written.

pub mod array_reference;
pub mod array_type;
pub mod class_loader_reference;
pub mod class_object_reference;
pub mod class_type;
pub mod event_request;
pub mod interface_type;
pub mod method;
pub mod object_reference;
pub mod reference_type;
pub mod stack_frame;
pub mod string_reference;
pub mod thread_group_reference;
pub mod thread_reference;
pub mod virtual_machine;

macro_rules! command {
    (
        command_set: $set_name:ident = $command_set:expr;
        command: $command:expr;
        $(#[$meta:meta])*
        $vis:vis struct $command_id:ident {
            $($field_vis:vis $field:ident: $field_ty:ty),+
            $(,)?
        } -> {
            $(
                $reply_field_vis:vis $reply_field:ident: $reply_field_ty:ty
            ),*
            $(,)?
        }
    ) => {
        paste::paste! {
            $(#[$meta])*
            $vis struct $command_id {
                $(
                    $field_vis $field: $field_ty,
                )+
            }

            impl crate::codec::JdwpEncodable for $command_id {
                fn encode(&self, encoder: &mut crate::codec::JdwpEncoder) {
                    $(
                        encoder.put(&self.$field);
                    )+
                }
            }

            impl crate::packet::JdwpCommand for $command_id {
                type Reply = [<$command_id Reply>];

                const NAME: &'static str =
                    concat!(stringify!($set_name), ".", stringify!($command_id));

                fn command_data() -> crate::raw::packet::CommandData {
                    crate::raw::packet::CommandData::new($command_set, $command)
                }
            }

            $(#[$meta])*
            $vis struct [<$command_id Reply>] {
                $(
                    $reply_field_vis $reply_field: $reply_field_ty,
                )*
            }

            impl crate::codec::JdwpDecodable for [<$command_id Reply>] {
                type Err = crate::codec::DecodeJdwpDataError;

                fn decode(
                    decoder: &mut crate::codec::JdwpDecoder,
                ) -> Result<Self, Self::Err> {
                    Ok(Self {
                        $(
                            $reply_field: decoder.get()?,
                        )*
                    })
                }
            }
        }
    };
    (
        command_set: $set_name:ident = $command_set:expr;
        command: $command:expr;
        $(#[$meta:meta])*
        $vis:vis struct $command_id:ident -> {
            $(
                $reply_field_vis:vis $reply_field:ident: $reply_field_ty:ty
            ),*
            $(,)?
        }
    ) => {
        paste::paste! {
            $(#[$meta])*
            $vis struct $command_id;

            impl crate::codec::JdwpEncodable for $command_id {}

            impl crate::packet::JdwpCommand for $command_id {
                type Reply = [<$command_id Reply>];

                const NAME: &'static str =
                    concat!(stringify!($set_name), ".", stringify!($command_id));

                fn command_data() -> crate::raw::packet::CommandData {
                    crate::raw::packet::CommandData::new($command_set, $command)
                }
            }

            $(#[$meta])*
            $vis struct [<$command_id Reply>] {
                $(
                    $reply_field_vis $reply_field: $reply_field_ty,
                )*
            }

            impl crate::codec::JdwpDecodable for [<$command_id Reply>] {
                type Err = crate::codec::DecodeJdwpDataError;

                fn decode(
                    decoder: &mut crate::codec::JdwpDecoder,
                ) -> Result<Self, Self::Err> {
                    Ok(Self {
                        $(
                            $reply_field: decoder.get()?,
                        )*
                    })
                }
            }
        }
    };
    (
        command_set: $set_name:ident = $command_set:expr;
        command: $command:expr;
        $(#[$meta:meta])*
        $vis:vis struct $command_id:ident {
            $($field_vis:vis $field:ident: $field_ty:ty),+
            $(,)?
        };
    ) => {
        $(#[$meta])*
        $vis struct $command_id {
            $(
                $field_vis $field: $field_ty,
            )+
        }

        impl crate::codec::JdwpEncodable for $command_id {
            fn encode(&self, encoder: &mut crate::codec::JdwpEncoder) {
                $(
                    encoder.put(&self.$field);
                )+
            }
        }

        impl crate::packet::JdwpCommand for $command_id {
            type Reply = ();

            const NAME: &'static str =
                concat!(stringify!($set_name), ".", stringify!($command_id));

            const EXPECTS_REPLY: bool = false;

            fn command_data() -> crate::raw::packet::CommandData {
                crate::raw::packet::CommandData::new($command_set, $command)
            }
        }
    };
    (
        command_set: $set_name:ident = $command_set:expr;
        command: $command:expr;
        $(#[$meta:meta])*
        $vis:vis struct $command_id:ident;
    ) => {
        $(#[$meta])*
        $vis struct $command_id;

        impl crate::codec::JdwpEncodable for $command_id {}

        impl crate::packet::JdwpCommand for $command_id {
            type Reply = ();

            const NAME: &'static str =
                concat!(stringify!($set_name), ".", stringify!($command_id));

            const EXPECTS_REPLY: bool = false;

            fn command_data() -> crate::raw::packet::CommandData {
                crate::raw::packet::CommandData::new($command_set, $command)
            }
        }
    };
}

pub(crate) use command;
