use crate::{
    key_value_store::StoreError,
    resp::RespValue,
    stream::{StreamFields, StreamId},
};

/// Parses the start of an `XRANGE` range, where `-` stands for the smallest possible ID.
pub fn parse_range_start(argument: &str) -> Result<StreamId, StoreError> {
    match argument {
        "-" => Ok(StreamId::MIN),
        id => id.parse::<StreamId>(),
    }
}

/// Parses the end of an `XRANGE` range, where `+` stands for the largest possible ID.
pub fn parse_range_end(argument: &str) -> Result<StreamId, StoreError> {
    match argument {
        "+" => Ok(StreamId::MAX),
        id => id.parse::<StreamId>(),
    }
}

/// Converts stream entries into `[[id, [field, value, ...]], ...]`.
pub fn parse_stream_entries_to_resp(entries: Vec<(StreamId, StreamFields)>) -> RespValue {
    RespValue::Array(
        entries
            .into_iter()
            .map(|(id, fields)| {
                let mut field_values: Vec<RespValue> = Vec::with_capacity(fields.len() * 2);

                for (field, value) in fields {
                    field_values.push(RespValue::BulkString(field));
                    field_values.push(RespValue::BulkString(value));
                }

                RespValue::Array(vec![
                    RespValue::BulkString(id.to_string()),
                    RespValue::Array(field_values),
                ])
            })
            .collect(),
    )
}
