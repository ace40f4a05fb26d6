//! Message-Dispatcher – Routet Client-Events an die Raum-Handler
//!
//! Die Handler sind synchron: Registry-Zugriffe halten einen Mutex nur
//! kurz, Zustellung laeuft ueber `try_send`. Ein Fehler betrifft nur die
//! einzelne Operation, nie die Verbindung oder den Raum.
//!
//! ## Zustaende
//! ```text
//! Connected --join--> InRoom(room) --leave--> Connected
//!     |                    |
//!     +---- disconnect ----+--> Disconnected
//! ```
//! Ein `join` in einen anderen Raum ist ein implizites Verlassen des
//! alten Raums gefolgt vom Beitritt.

use flurfunk_core::{ConnectionId, RoomId};
use flurfunk_protocol::{ClientEvent, Payload, ServerEvent};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::{RelayError, RelayResult};
use crate::server_state::RelayState;

/// Name in Hinweisen wenn kein Nickname bekannt ist
const UNBEKANNTER_NICKNAME: &str = "someone";

/// Zustand einer Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Verbunden, in keinem Raum
    Connected,
    /// Mitglied genau eines Raums
    InRoom(RoomId),
    /// Transport getrennt, alle Mitgliedschaften aufgeraeumt
    Disconnected,
}

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
#[derive(Debug)]
pub struct DispatcherContext {
    pub conn_id: ConnectionId,
    /// Peer-Adresse (nur fuer Logs)
    pub peer_addr: Option<SocketAddr>,
    pub zustand: ConnectionState,
    /// Zuletzt verwendeter Nickname pro Raum (fuer Trennungs-Hinweise)
    nicknames: HashMap<RoomId, String>,
}

impl DispatcherContext {
    pub fn neu(conn_id: ConnectionId, peer_addr: Option<SocketAddr>) -> Self {
        Self {
            conn_id,
            peer_addr,
            zustand: ConnectionState::Connected,
            nicknames: HashMap::new(),
        }
    }

    /// Aktueller Raum (None ausserhalb von `InRoom`)
    pub fn raum(&self) -> Option<&RoomId> {
        match &self.zustand {
            ConnectionState::InRoom(room) => Some(room),
            _ => None,
        }
    }

    fn nickname_fuer(&self, room: &RoomId) -> &str {
        self.nicknames
            .get(room)
            .map(String::as_str)
            .unwrap_or(UNBEKANNTER_NICKNAME)
    }
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<RelayState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<RelayState>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein dekodiertes Client-Event
    pub fn dispatch(&self, event: ClientEvent, ctx: &mut DispatcherContext) -> RelayResult<()> {
        match event {
            ClientEvent::JoinRoom { room_id, nickname } => {
                self.handle_join(ctx, room_id, nickname)
            }
            ClientEvent::SendMessage {
                room_id,
                from,
                payload,
            } => self.handle_send(ctx, &room_id, from, payload),
            ClientEvent::LeaveRoom { room_id, nickname } => {
                self.handle_leave(ctx, &room_id, &nickname)
            }
        }
    }

    /// `join-room`: Beitritt, Hinweis an alle anderen Mitglieder
    pub fn handle_join(
        &self,
        ctx: &mut DispatcherContext,
        room: RoomId,
        nickname: String,
    ) -> RelayResult<()> {
        // Implizites Verlassen des bisherigen Raums
        if let ConnectionState::InRoom(alt) = &ctx.zustand {
            if *alt != room {
                let alt = alt.clone();
                let alter_nick = ctx.nickname_fuer(&alt).to_string();
                self.verlassen(ctx, &alt, &alter_nick);
                tracing::debug!(
                    conn = %ctx.conn_id,
                    alt = %alt.kurz(),
                    neu = %room.kurz(),
                    "Raumwechsel"
                );
            }
        }

        let neu_beigetreten = self.state.registry.join(&room, ctx.conn_id);
        ctx.nicknames.insert(room.clone(), nickname.clone());
        ctx.zustand = ConnectionState::InRoom(room.clone());

        if neu_beigetreten {
            self.hinweis_senden(&room, &ctx.conn_id, &ServerEvent::beigetreten(&nickname));
            tracing::info!(conn = %ctx.conn_id, room = %room.kurz(), "Raum beigetreten");
        } else {
            tracing::debug!(conn = %ctx.conn_id, room = %room.kurz(), "Bereits Mitglied");
        }

        self.state.gauges_aktualisieren();
        Ok(())
    }

    /// `send-message`: unveraendert an alle anderen Mitglieder weiterleiten
    pub fn handle_send(
        &self,
        ctx: &mut DispatcherContext,
        room: &RoomId,
        from: String,
        payload: Payload,
    ) -> RelayResult<()> {
        if !self.state.registry.is_member(room, ctx.conn_id) {
            return Err(RelayError::NotAMember { room: room.clone() });
        }

        let ist_datei = payload.ist_datei();
        let bytes = payload.inhalt().len();
        let mitglieder = self.state.registry.members(room);
        let zustellung = self.state.broadcaster.an_mitglieder_ausser_senden(
            &mitglieder,
            &ctx.conn_id,
            &ServerEvent::ReceiveMessage { from, payload },
        );

        self.state.metriken.envelopes_relayed_total.inc();
        self.state.zustellung_erfassen(zustellung);
        tracing::debug!(
            conn = %ctx.conn_id,
            room = %room.kurz(),
            datei = ist_datei,
            bytes = bytes,
            empfaenger = zustellung.gesendet,
            verworfen = zustellung.verworfen,
            "Nachricht weitergeleitet"
        );
        Ok(())
    }

    /// `leave-room`: Austritt, Hinweis an verbleibende Mitglieder
    pub fn handle_leave(
        &self,
        ctx: &mut DispatcherContext,
        room: &RoomId,
        nickname: &str,
    ) -> RelayResult<()> {
        if !self.state.registry.is_member(room, ctx.conn_id) {
            return Err(RelayError::NotAMember { room: room.clone() });
        }

        self.verlassen(ctx, room, nickname);
        tracing::info!(conn = %ctx.conn_id, room = %room.kurz(), "Raum verlassen");
        self.state.gauges_aktualisieren();
        Ok(())
    }

    /// Transport getrennt: aus allen Raeumen entfernen, Hinweise verteilen
    ///
    /// Darf aus jedem Zustand aufgerufen werden.
    pub fn handle_disconnect(&self, ctx: &mut DispatcherContext) {
        let raeume = self.state.registry.remove_everywhere(ctx.conn_id);
        for room in &raeume {
            let nickname = ctx.nickname_fuer(room).to_string();
            let mitglieder = self.state.registry.members(room);
            self.hinweis_an(&mitglieder, &ctx.conn_id, &ServerEvent::verlassen(&nickname));
        }

        self.state.broadcaster.client_entfernen(&ctx.conn_id);
        ctx.nicknames.clear();
        ctx.zustand = ConnectionState::Disconnected;
        self.state.gauges_aktualisieren();

        tracing::debug!(
            conn = %ctx.conn_id,
            raeume = raeume.len(),
            "Verbindung aufgeraeumt"
        );
    }

    /// Meldet einen Fehler nur an den Absender
    pub fn fehler_melden(&self, ctx: &DispatcherContext, fehler: &RelayError) {
        self.state.metriken.abgelehnt(fehler.grund());
        tracing::debug!(conn = %ctx.conn_id, fehler = %fehler, "Anfrage abgelehnt");
        if !self
            .state
            .broadcaster
            .an_client_senden(&ctx.conn_id, &fehler.als_event())
        {
            self.state.metriken.deliveries_dropped_total.inc();
        }
    }

    fn verlassen(&self, ctx: &mut DispatcherContext, room: &RoomId, nickname: &str) {
        self.state.registry.leave(room, ctx.conn_id);
        ctx.nicknames.remove(room);
        if ctx.raum() == Some(room) {
            ctx.zustand = ConnectionState::Connected;
        }
        self.hinweis_senden(room, &ctx.conn_id, &ServerEvent::verlassen(nickname));
    }

    fn hinweis_senden(&self, room: &RoomId, ausloeser: &ConnectionId, hinweis: &ServerEvent) {
        let mitglieder = self.state.registry.members(room);
        self.hinweis_an(&mitglieder, ausloeser, hinweis);
    }

    fn hinweis_an(
        &self,
        mitglieder: &std::collections::HashSet<ConnectionId>,
        ausloeser: &ConnectionId,
        hinweis: &ServerEvent,
    ) {
        let zustellung = self
            .state
            .broadcaster
            .an_mitglieder_ausser_senden(mitglieder, ausloeser, hinweis);
        self.state.metriken.notices_total.inc();
        self.state.zustellung_erfassen(zustellung);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
