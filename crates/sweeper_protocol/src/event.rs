//! Server → client events.

use crate::{error::ProtocolError, frame::Frame, opcode};
use sweeper_core::{BoardParams, Coord, GameEvent, TileDelta, TileKind};
use tracing::{trace, warn};

struct ConnectedLayout;

impl ConnectedLayout {
    const SESSION_ID: usize = 1;
    const ROWS: usize = 2;
    const COLS: usize = 3;
    const MINE_COUNT: usize = 4;
    const LEN: usize = 5;
}

struct RevealBatchLayout;

impl RevealBatchLayout {
    const COUNT: usize = 1;
    const HEADER_LEN: usize = 3;
    const TILE_LEN: usize = 5;
    // Offsets within one tile record
    const TILE_Y: usize = 0;
    const TILE_X: usize = 2;
    const TILE_TYPE: usize = 4;
}

/// Encodes an event into one frame.
///
/// # Returns
///
/// The frame bytes, or `ProtocolError::BatchTooLarge` for a reveal batch of
/// more than `u16::MAX` tiles.
pub fn encode_event(event: &GameEvent) -> Result<Vec<u8>, ProtocolError> {
    let frame = match event {
        GameEvent::Connected { session_id, params } => vec![
            opcode::CONNECTED,
            *session_id,
            params.rows,
            params.cols,
            params.mine_count,
        ],
        GameEvent::RevealBatch(tiles) => {
            let count = u16::try_from(tiles.len()).map_err(|_| {
                warn!("⚠️ Reveal batch of {} tiles does not fit one frame", tiles.len());
                ProtocolError::BatchTooLarge(tiles.len())
            })?;

            let mut buf = Vec::with_capacity(
                RevealBatchLayout::HEADER_LEN + tiles.len() * RevealBatchLayout::TILE_LEN,
            );
            buf.push(opcode::REVEAL_BATCH);
            buf.extend_from_slice(&count.to_be_bytes());
            for tile in tiles {
                buf.extend_from_slice(&tile.coord.row.to_be_bytes());
                buf.extend_from_slice(&tile.coord.col.to_be_bytes());
                buf.push(tile.kind.to_wire() as u8);
            }
            buf
        }
        GameEvent::Lost => vec![opcode::LOST],
        GameEvent::Won => vec![opcode::WON],
        GameEvent::Reset => vec![opcode::SESSION_RESET],
    };

    Ok(frame)
}

/// Decodes one server frame.
pub fn decode_event(bytes: &[u8]) -> Result<GameEvent, ProtocolError> {
    let frame = Frame::parse(bytes)?;

    match frame.opcode() {
        opcode::CONNECTED => {
            frame.require(ConnectedLayout::LEN)?;
            Ok(GameEvent::Connected {
                session_id: frame.u8_at(ConnectedLayout::SESSION_ID)?,
                // Reported as sent; the server only announces valid boards
                params: BoardParams {
                    rows: frame.u8_at(ConnectedLayout::ROWS)?,
                    cols: frame.u8_at(ConnectedLayout::COLS)?,
                    mine_count: frame.u8_at(ConnectedLayout::MINE_COUNT)?,
                },
            })
        }
        opcode::REVEAL_BATCH => {
            frame.require(RevealBatchLayout::HEADER_LEN)?;
            let count = usize::from(frame.u16_at(RevealBatchLayout::COUNT)?);
            frame.require(RevealBatchLayout::HEADER_LEN + count * RevealBatchLayout::TILE_LEN)?;

            let mut tiles = Vec::with_capacity(count);
            for index in 0..count {
                let base = RevealBatchLayout::HEADER_LEN + index * RevealBatchLayout::TILE_LEN;
                let row = frame.u16_at(base + RevealBatchLayout::TILE_Y)?;
                let col = frame.u16_at(base + RevealBatchLayout::TILE_X)?;
                let raw = frame.i8_at(base + RevealBatchLayout::TILE_TYPE)?;
                let Some(kind) = TileKind::from_wire(raw) else {
                    trace!("Tile record {} carries invalid type {}", index, raw);
                    return Err(ProtocolError::InvalidTileType(raw));
                };
                tiles.push(TileDelta::new(Coord::new(row, col), kind));
            }
            Ok(GameEvent::RevealBatch(tiles))
        }
        opcode::LOST => Ok(GameEvent::Lost),
        opcode::WON => Ok(GameEvent::Won),
        opcode::SESSION_RESET => Ok(GameEvent::Reset),
        unknown => Err(ProtocolError::UnknownOpcode(unknown)),
    }
}
