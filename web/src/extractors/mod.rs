pub(crate) mod request_origin;
