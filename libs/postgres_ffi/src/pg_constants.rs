//!
//! Misc constants, copied from PostgreSQL headers.
//!
//! It's nice to have them all here in one place, and have the ability to add
//! comments on them.
//!

//
// From pg_tablespace_d.h
//
pub const DEFAULTTABLESPACE_OID: u32 = 1663;
pub const GLOBALTABLESPACE_OID: u32 = 1664;

//
// From bufpage.h
//
pub const SIZE_OF_PAGE_HEADER_DATA: usize = 24;

/* pd_flags: any bits outside this mask mean the header is garbage */
pub const PD_VALID_FLAG_BITS: u16 = 0x0007;

//
// From relpath.h
//
pub const PG_TBLSPC_DIR: &str = "pg_tblspc";
pub const PG_GLOBAL_DIR: &str = "global";
pub const PG_BASE_DIR: &str = "base";

//
// From xlog_internal.h and pg_control.h
//
pub const PG_CONTROL_FILE_NAME: &str = "global/pg_control";
pub const PG_WAL_DIR: &str = "pg_wal";

pub const XLOG_PAGE_MAGIC: u16 = 0xD098; /* PG 11 */

pub const XLP_FIRST_IS_CONTRECORD: u16 = 0x0001;
pub const XLP_LONG_HEADER: u16 = 0x0002;

//
// From rmgrlist.h
//
pub const RM_XLOG_ID: u8 = 0;
pub const RM_XACT_ID: u8 = 1;

// From pg_control.h
pub const XLOG_SWITCH: u8 = 0x40;

// From xact.h
pub const XLOG_XACT_COMMIT: u8 = 0x00;
pub const XLOG_XACT_ABORT: u8 = 0x20;
/* mask for filtering opcodes out of xl_info */
pub const XLOG_XACT_OPMASK: u8 = 0x70;

// from xlogreader.h
pub const XLR_INFO_MASK: u8 = 0x0F;

//
// from xlogrecord.h
//
pub const XLR_MAX_BLOCK_ID: u8 = 32;

pub const XLR_BLOCK_ID_DATA_SHORT: u8 = 255;
pub const XLR_BLOCK_ID_DATA_LONG: u8 = 254;
pub const XLR_BLOCK_ID_ORIGIN: u8 = 253;
pub const XLR_BLOCK_ID_TOPLEVEL_XID: u8 = 252;

pub const BKPBLOCK_FORK_MASK: u8 = 0x0F;
pub const BKPBLOCK_HAS_IMAGE: u8 = 0x10; /* block data is an XLogRecordBlockImage */
pub const BKPBLOCK_HAS_DATA: u8 = 0x20;
pub const BKPBLOCK_WILL_INIT: u8 = 0x40; /* redo will re-init the page */
pub const BKPBLOCK_SAME_REL: u8 = 0x80; /* RelFileNode omitted, same as previous */

/* Information stored in bimg_info */
pub const BKPIMAGE_HAS_HOLE: u8 = 0x01; /* page image has "hole" */
pub const BKPIMAGE_IS_COMPRESSED: u8 = 0x02; /* page image is compressed */
pub const BKPIMAGE_APPLY: u8 = 0x04; /* page image should be restored during replay */

/* From transam.h */
pub const INVALID_TRANSACTION_ID: u32 = 0;
