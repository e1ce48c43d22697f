#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Hex32(u32);

impl std::fmt::Debug for Hex32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

macro_rules! impl_tags {
    ( $( ($name:ident, $val:expr) ),* ) => {
        /// Element IDs known to the probe. Anything else is [Tag::Other].
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub enum Tag {
            $(
                $name,
            )*
            Other(Hex32),
        }

        impl Tag {
            pub fn id(&self) -> u32 {
                use Tag::*;
                match self {
                    $(
                        $name => $val,
                    )*
                    Other(Hex32(id)) => *id,
                }
            }
        }

        impl From<u32> for Tag {
            fn from(id: u32) -> Tag {
                use Tag::*;
                match id {
                    $(
                        $val => $name,
                    )*
                    id => Other(Hex32(id)),
                }
            }
        }
    };
}

// https://github.com/ietf-wg-cellar/matroska-specification/blob/master/ebml_matroska.xml

impl_tags!(
    // EBML header
    (EBML, 0x1a45_dfa3),
    (EBMLVersion, 0x4286),
    (EBMLReadVersion, 0x42f7),
    (EBMLMaxIDLength, 0x42f2),
    (EBMLMaxSizeLength, 0x42f3),
    (DocType, 0x4282),
    (DocTypeVersion, 0x4287),
    (DocTypeReadVersion, 0x4285),
    // Global
    (Void, 0xec),
    (Crc32, 0xbf),
    // Segment and its top-level children
    (Segment, 0x1853_8067),
    (SeekHead, 0x114d_9b74),
    (Info, 0x1549_a966),
    (Tracks, 0x1654_ae6b),
    (Cluster, 0x1f43_b675),
    (Cues, 0x1c53_bb6b),
    (Chapters, 0x1043_a770),
    (Attachments, 0x1941_a469),
    (Tags, 0x1254_c367),
    // Info
    (TimestampScale, 0x2a_d7b1),
    (Duration, 0x4489),
    (DateUTC, 0x4461),
    (Title, 0x7ba9),
    (MuxingApp, 0x4d80),
    (WritingApp, 0x5741),
    // Tracks
    (TrackEntry, 0xae),
    (TrackNumber, 0xd7),
    (TrackUID, 0x73c5),
    (TrackType, 0x83),
    (CodecID, 0x86),
    // Cluster
    (Timestamp, 0xe7),
    (SimpleBlock, 0xa3),
    (BlockGroup, 0xa0),
    (Block, 0xa1),
    // Cues
    (CuePoint, 0xbb),
    // Tags
    (TagElement, 0x7373),
    (SimpleTag, 0x67c8),
    (TagName, 0x45a3),
    (TagString, 0x4487)
);

impl Tag {
    /// Direct children of a Segment, plus the top-level elements.
    ///
    /// Inside an unknown-size element, one of these marks the end of the
    /// element.
    pub fn is_boundary(&self) -> bool {
        use Tag::*;
        matches!(
            self,
            EBML | Segment
                | SeekHead
                | Info
                | Tracks
                | Cluster
                | Cues
                | Chapters
                | Attachments
                | Tags
        )
    }
}
