use crate::define_id_type;

define_id_type!(ResourceId, u32);
define_id_type!(GroupId, u32);
define_id_type!(TaskId, u64);
define_id_type!(ClaimId, u64);

// External identifiers handed over by the specification pipeline.
// Opaque to the scheduler; carried through into notifications only.
define_id_type!(MomId, u64);
define_id_type!(OtdbId, u64);
