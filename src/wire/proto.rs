// Generated by build.rs from protos/chatpeer.proto.
include!("../../generated/chatpeer.rs");
