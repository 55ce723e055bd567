//! Writer for small uncompressed PBF snapshots used in tests.
//!
//! Every call to `dense_nodes`, `ways` or `relations` appends one `OSMData`
//! blob with its own string table, after the `OSMHeader` blob written by
//! [`PbfBuilder::new`].

use crate::model::MemberType;

type TagList<'a> = &'a [(&'a str, &'a str)];

pub struct PbfBuilder {
    bytes: Vec<u8>,
}

impl PbfBuilder {
    pub fn new() -> Self {
        let mut header = Vec::new();
        string_field(&mut header, 4, "OsmSchema-V0.6");
        string_field(&mut header, 4, "DenseNodes");
        string_field(&mut header, 16, "osmextract-tests");

        let mut builder = PbfBuilder { bytes: Vec::new() };
        builder.push_blob("OSMHeader", &header);
        builder
    }

    /// `(id, lat, lon, tags)` in one dense group.
    pub fn dense_nodes(mut self, nodes: &[(i64, f64, f64, TagList)]) -> Self {
        let mut strings = StringTable::default();
        let (mut id, mut lat, mut lon) = (0i64, 0i64, 0i64);
        let (mut ids, mut lats, mut lons, mut keys_vals) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());

        for &(node_id, node_lat, node_lon, tags) in nodes {
            let (next_lat, next_lon) = (to_units(node_lat), to_units(node_lon));
            ids.push(zigzag(node_id - id));
            lats.push(zigzag(next_lat - lat));
            lons.push(zigzag(next_lon - lon));
            (id, lat, lon) = (node_id, next_lat, next_lon);

            for &(k, v) in tags {
                keys_vals.push(strings.index(k));
                keys_vals.push(strings.index(v));
            }
            keys_vals.push(0);
        }

        let mut dense = Vec::new();
        packed_field(&mut dense, 1, &ids);
        packed_field(&mut dense, 8, &lats);
        packed_field(&mut dense, 9, &lons);
        packed_field(&mut dense, 10, &keys_vals);

        let mut group = Vec::new();
        bytes_field(&mut group, 2, &dense);
        self.push_block(strings, &group);
        self
    }

    /// `(id, node refs, tags)`.
    pub fn ways(mut self, ways: &[(i64, &[i64], TagList)]) -> Self {
        let mut strings = StringTable::default();
        let mut group = Vec::new();

        for &(way_id, refs, tags) in ways {
            let mut way = Vec::new();
            varint_field(&mut way, 1, way_id as u64);
            tag_fields(&mut way, &mut strings, tags);
            packed_field(&mut way, 8, &deltas(refs.iter().copied()));
            bytes_field(&mut group, 3, &way);
        }

        self.push_block(strings, &group);
        self
    }

    /// `(id, members as (type, id, role), tags)`.
    pub fn relations(mut self, relations: &[(i64, &[(MemberType, i64, &str)], TagList)]) -> Self {
        let mut strings = StringTable::default();
        let mut group = Vec::new();

        for &(relation_id, members, tags) in relations {
            let mut relation = Vec::new();
            varint_field(&mut relation, 1, relation_id as u64);
            tag_fields(&mut relation, &mut strings, tags);

            let roles: Vec<u64> = members
                .iter()
                .map(|&(_, _, role)| strings.index(role))
                .collect();
            let types: Vec<u64> = members
                .iter()
                .map(|&(member_type, _, _)| match member_type {
                    MemberType::Node => 0,
                    MemberType::Way => 1,
                    MemberType::Relation => 2,
                })
                .collect();
            packed_field(&mut relation, 8, &roles);
            packed_field(&mut relation, 9, &deltas(members.iter().map(|&(_, id, _)| id)));
            packed_field(&mut relation, 10, &types);
            bytes_field(&mut group, 4, &relation);
        }

        self.push_block(strings, &group);
        self
    }

    /// Raw bytes appended verbatim, for corrupting the tail of a snapshot.
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }

    fn push_block(&mut self, strings: StringTable, group: &[u8]) {
        let mut table = Vec::new();
        for s in &strings.0 {
            string_field(&mut table, 1, s);
        }
        let mut block = Vec::new();
        bytes_field(&mut block, 1, &table);
        bytes_field(&mut block, 2, group);
        self.push_blob("OSMData", &block);
    }

    fn push_blob(&mut self, kind: &str, data: &[u8]) {
        let mut blob = Vec::new();
        bytes_field(&mut blob, 1, data);
        varint_field(&mut blob, 2, data.len() as u64);

        let mut header = Vec::new();
        string_field(&mut header, 1, kind);
        varint_field(&mut header, 3, blob.len() as u64);

        self.bytes
            .extend_from_slice(&(header.len() as u32).to_be_bytes());
        self.bytes.extend_from_slice(&header);
        self.bytes.extend_from_slice(&blob);
    }
}

/// Ways, relations and nodes that cover the resolver's edge cases:
///
/// - nodes 1..=5 (node 1 tagged `amenity=cafe`, node 3 at lat 1, lon 1)
/// - way 10: closed square over nodes 1-4, `building=yes`
/// - way 11: references node 99, which does not exist
/// - way 12: `highway=residential`, not a member of any relation
/// - relation 20: outer way 10, outer way 404 (absent), node 5 as `label`
/// - relation 21: route over way 11
pub fn snapshot() -> Vec<u8> {
    snapshot_builder().build()
}

pub fn snapshot_builder() -> PbfBuilder {
    PbfBuilder::new()
        .dense_nodes(&[
            (1, 0.0, 0.0, &[("amenity", "cafe")]),
            (2, 0.0, 1.0, &[]),
            (3, 1.0, 1.0, &[]),
            (4, 1.0, 0.0, &[]),
            (5, 2.0, 2.0, &[]),
        ])
        .ways(&[
            (10, &[1, 2, 3, 4, 1], &[("building", "yes")]),
            (11, &[3, 99, 5], &[("highway", "path")]),
            (12, &[4, 5], &[("highway", "residential")]),
        ])
        .relations(&[
            (
                20,
                &[
                    (MemberType::Way, 10, "outer"),
                    (MemberType::Way, 404, "outer"),
                    (MemberType::Node, 5, "label"),
                ],
                &[("type", "multipolygon")],
            ),
            (21, &[(MemberType::Way, 11, "")], &[("type", "route")]),
        ])
}

#[derive(Default)]
struct StringTable(Vec<String>);

impl StringTable {
    /// Index of `s`, adding it if new. Index 0 is reserved for the empty
    /// string that terminates dense node tags.
    fn index(&mut self, s: &str) -> u64 {
        if self.0.is_empty() {
            self.0.push(String::new());
        }
        if let Some(i) = self.0.iter().position(|existing| existing == s) {
            return i as u64;
        }
        self.0.push(s.to_string());
        (self.0.len() - 1) as u64
    }
}

/// Degrees to the default granularity of 100 nanodegrees.
fn to_units(degrees: f64) -> i64 {
    (degrees * 1e7).round() as i64
}

fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn deltas(values: impl Iterator<Item = i64>) -> Vec<u64> {
    let mut last = 0;
    values
        .map(|value| {
            let delta = zigzag(value - last);
            last = value;
            delta
        })
        .collect()
}

fn tag_fields(out: &mut Vec<u8>, strings: &mut StringTable, tags: TagList) {
    let keys: Vec<u64> = tags.iter().map(|&(k, _)| strings.index(k)).collect();
    let vals: Vec<u64> = tags.iter().map(|&(_, v)| strings.index(v)).collect();
    packed_field(out, 2, &keys);
    packed_field(out, 3, &vals);
}

fn varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn varint_field(out: &mut Vec<u8>, field: u64, value: u64) {
    varint(out, field << 3);
    varint(out, value);
}

fn bytes_field(out: &mut Vec<u8>, field: u64, data: &[u8]) {
    varint(out, (field << 3) | 2);
    varint(out, data.len() as u64);
    out.extend_from_slice(data);
}

fn string_field(out: &mut Vec<u8>, field: u64, s: &str) {
    bytes_field(out, field, s.as_bytes());
}

fn packed_field(out: &mut Vec<u8>, field: u64, values: &[u64]) {
    if values.is_empty() {
        return;
    }
    let mut payload = Vec::new();
    for &value in values {
        varint(&mut payload, value);
    }
    bytes_field(out, field, &payload);
}
