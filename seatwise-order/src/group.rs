use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use seatwise_catalog::{discounted, Flight, SeatCode};
use seatwise_core::{BookingError, BookingResult, Money};
use seatwise_shared::Masked;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::booking::Booking;
use crate::component::PricedComponent;
use crate::passenger::Passenger;

/// Group reference such as `GRP-042917`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Primary contact for a group. Email and phone never show up in logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupContact {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

impl GroupContact {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: Masked::new(email.into()),
            phone: Masked::new(phone.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    /// Seats are being assigned; nothing has been paid.
    Pending,
    Committed,
    /// Payment failed or the group was abandoned. Holds no seats.
    Discarded,
}

#[derive(Debug)]
struct GroupMember {
    name: String,
    passenger: Weak<Passenger>,
    booking: Booking,
}

/// Several passengers booked together on one flight with one discount.
///
/// Every member has exactly one booking. A seat appears in the assignment
/// map for at most one member and is always held in the flight's grid while
/// it is there.
///
/// A pending group holds real seats, so it must end in
/// `BookingService::commit_group` or be abandoned; dropping it keeps the
/// seats occupied. Stores hand out [`GroupSnapshot`]s, never copies of the
/// group itself.
#[derive(Debug)]
pub struct GroupBooking {
    id: GroupId,
    flight: Arc<Flight>,
    members: Vec<GroupMember>,
    seat_assignments: HashMap<String, SeatCode>,
    discount_percentage: f64,
    contact: GroupContact,
    status: GroupStatus,
    created_at: DateTime<Utc>,
}

impl GroupBooking {
    /// New pending group with one unseated booking per passenger.
    /// Passengers sharing a name are collapsed into one member.
    pub fn new(
        id: GroupId,
        flight: Arc<Flight>,
        passengers: &[Arc<Passenger>],
        discount_percentage: f64,
        contact: GroupContact,
    ) -> Self {
        let mut group = Self {
            id,
            flight,
            members: Vec::with_capacity(passengers.len()),
            seat_assignments: HashMap::new(),
            discount_percentage,
            contact,
            status: GroupStatus::Pending,
            created_at: Utc::now(),
        };
        for passenger in passengers {
            group.add_passenger(passenger);
        }
        group
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn flight(&self) -> &Arc<Flight> {
        &self.flight
    }

    pub fn discount_percentage(&self) -> f64 {
        self.discount_percentage
    }

    pub fn contact(&self) -> &GroupContact {
        &self.contact
    }

    pub fn status(&self) -> GroupStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn passenger_count(&self) -> usize {
        self.members.len()
    }

    pub fn passenger_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    /// Members whose `Passenger` is still alive, in group order.
    pub fn passengers(&self) -> Vec<Arc<Passenger>> {
        self.members.iter().filter_map(|m| m.passenger.upgrade()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Bookings in member order.
    pub fn bookings(&self) -> Vec<&Booking> {
        self.members.iter().map(|m| &m.booking).collect()
    }

    pub fn booking_for(&self, name: &str) -> Option<&Booking> {
        self.position(name).map(|i| &self.members[i].booking)
    }

    pub fn assigned_seat(&self, name: &str) -> Option<SeatCode> {
        self.seat_assignments.get(name).copied()
    }

    pub fn seat_assignments(&self) -> &HashMap<String, SeatCode> {
        &self.seat_assignments
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }

    fn ensure_active(&self) -> BookingResult<()> {
        if self.status == GroupStatus::Discarded {
            return Err(BookingError::GroupDiscarded(self.id.to_string()));
        }
        Ok(())
    }

    fn not_in_group(&self, name: &str) -> BookingError {
        BookingError::PassengerNotInGroup {
            group: self.id.to_string(),
            passenger: name.to_string(),
        }
    }

    /// Seat one member.
    ///
    /// `Ok(false)` means the seat is taken; the member keeps whatever seat
    /// they had. On success the previous seat is released and the member's
    /// booking is rebuilt as a plain reservation over the new seat.
    pub fn assign_seat(&mut self, passenger: &Passenger, code: &str) -> BookingResult<bool> {
        self.assign_seat_for(passenger.name(), code)
    }

    pub fn assign_seat_for(&mut self, name: &str, code: &str) -> BookingResult<bool> {
        self.ensure_active()?;
        let index = self.position(name).ok_or_else(|| self.not_in_group(name))?;
        let seat = self.flight.seats().parse_seat_code(code)?;
        let previous = self.seat_assignments.get(name).copied();

        if !self.flight.seats().reassign(previous, seat)? {
            warn!(group = %self.id, passenger = name, seat = %seat, "group seat unavailable");
            return Ok(false);
        }

        self.seat_member(index, seat);
        info!(group = %self.id, passenger = name, seat = %seat, "group seat assigned");
        Ok(true)
    }

    fn seat_member(&mut self, index: usize, seat: SeatCode) {
        let member = &mut self.members[index];
        member.booking.replace_component(PricedComponent::reservation(
            Arc::clone(&self.flight),
            member.name.clone(),
            Some(seat),
        ));
        self.seat_assignments.insert(member.name.clone(), seat);
    }

    /// Give every unseated member the next free seat.
    ///
    /// Either every unseated member gets a seat or none does: if the flight
    /// runs out part way, the seats taken by this call are released.
    pub fn auto_assign(&mut self) -> BookingResult<Vec<(String, SeatCode)>> {
        self.ensure_active()?;
        let unseated: Vec<usize> = (0..self.members.len())
            .filter(|&i| !self.seat_assignments.contains_key(&self.members[i].name))
            .collect();

        let mut taken = Vec::with_capacity(unseated.len());
        for &index in &unseated {
            match self.flight.seats().allocate_next() {
                Some(seat) => taken.push((index, seat)),
                None => {
                    for (_, seat) in &taken {
                        self.flight.seats().release(*seat);
                    }
                    warn!(group = %self.id, needed = unseated.len(), "flight ran out of seats during auto assignment");
                    return Err(BookingError::FlightFull(self.flight.number().to_string()));
                }
            }
        }

        let mut assigned = Vec::with_capacity(taken.len());
        for (index, seat) in taken {
            self.seat_member(index, seat);
            assigned.push((self.members[index].name.clone(), seat));
        }
        info!(group = %self.id, seated = assigned.len(), "group seats auto assigned");
        Ok(assigned)
    }

    /// Returns false if a passenger with that name is already a member.
    pub fn add_passenger(&mut self, passenger: &Arc<Passenger>) -> bool {
        if self.contains(passenger.name()) {
            return false;
        }
        let component = PricedComponent::reservation(Arc::clone(&self.flight), passenger.name(), None);
        self.members.push(GroupMember {
            name: passenger.name().to_string(),
            passenger: Arc::downgrade(passenger),
            booking: Booking::new(component),
        });
        true
    }

    pub fn remove_passenger(&mut self, passenger: &Passenger) -> bool {
        self.remove_member(passenger.name())
    }

    /// Drop a member and release their seat. Returns false if absent.
    pub fn remove_member(&mut self, name: &str) -> bool {
        let Some(index) = self.position(name) else {
            return false;
        };
        if let Some(seat) = self.seat_assignments.remove(name) {
            self.flight.seats().release(seat);
        }
        self.members.remove(index);
        info!(group = %self.id, passenger = name, "passenger removed from group");
        true
    }

    pub fn are_all_seats_assigned(&self) -> bool {
        self.members
            .iter()
            .all(|m| self.seat_assignments.contains_key(&m.name))
    }

    /// Members still waiting for a seat, in group order.
    pub fn unassigned(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| !self.seat_assignments.contains_key(&m.name))
            .map(|m| m.name.as_str())
            .collect()
    }

    pub fn subtotal(&self) -> Money {
        self.members.iter().map(|m| m.booking.cost()).sum()
    }

    /// Subtotal after the group discount, priced from the live fare.
    pub fn total_cost(&self) -> Money {
        discounted(self.subtotal(), self.discount_percentage)
    }

    pub(crate) fn mark_committed(&mut self) {
        self.status = GroupStatus::Committed;
    }

    /// Read-only view of the group as it stands.
    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            id: self.id.clone(),
            flight: Arc::clone(&self.flight),
            status: self.status,
            passengers: self.members.iter().map(|m| m.name.clone()).collect(),
            seat_assignments: self
                .seat_assignments
                .iter()
                .map(|(name, seat)| (name.clone(), *seat))
                .collect(),
            discount_percentage: self.discount_percentage,
            subtotal: self.subtotal(),
            total_cost: self.total_cost(),
            contact: self.contact.clone(),
            created_at: self.created_at,
        }
    }

    /// Release every held seat and mark the group discarded.
    /// Returns how many seats were released.
    ///
    /// A committed group is paid for and keeps its seats; abandoning it is
    /// rejected.
    pub fn abandon(&mut self) -> BookingResult<usize> {
        match self.status {
            GroupStatus::Committed => {
                return Err(BookingError::Validation(format!(
                    "group {} is committed and cannot be abandoned",
                    self.id
                )))
            }
            GroupStatus::Discarded => return Ok(0),
            GroupStatus::Pending => {}
        }
        let released = self.seat_assignments.len();
        for (_, seat) in self.seat_assignments.drain() {
            self.flight.seats().release(seat);
        }
        for member in &mut self.members {
            member.booking.replace_component(PricedComponent::reservation(
                Arc::clone(&self.flight),
                member.name.clone(),
                None,
            ));
        }
        self.status = GroupStatus::Discarded;
        info!(group = %self.id, released, "group booking discarded");
        Ok(released)
    }
}

fn write_summary(
    f: &mut fmt::Formatter<'_>,
    id: &GroupId,
    passengers: usize,
    flight: &Flight,
    discount_percentage: f64,
    total_cost: Money,
) -> fmt::Result {
    let route = flight.route();
    write!(
        f,
        "Group Booking {}: {} passengers for flight {} ({} to {}) - Group Discount: {:.1}% - Total Cost: ${:.2}",
        id,
        passengers,
        flight.number(),
        route.departure,
        route.arrival,
        discount_percentage,
        total_cost
    )
}

impl fmt::Display for GroupBooking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(
            f,
            &self.id,
            self.members.len(),
            &self.flight,
            self.discount_percentage,
            self.total_cost(),
        )
    }
}

/// Point-in-time copy of a group. Holds no seats and cannot release any.
#[derive(Debug, Clone)]
pub struct GroupSnapshot {
    pub id: GroupId,
    pub flight: Arc<Flight>,
    pub status: GroupStatus,
    /// Member names in group order.
    pub passengers: Vec<String>,
    pub seat_assignments: BTreeMap<String, SeatCode>,
    pub discount_percentage: f64,
    pub subtotal: Money,
    pub total_cost: Money,
    pub contact: GroupContact,
    pub created_at: DateTime<Utc>,
}

impl GroupSnapshot {
    pub fn contains(&self, name: &str) -> bool {
        self.passengers.iter().any(|p| p == name)
    }

    pub fn passenger_count(&self) -> usize {
        self.passengers.len()
    }
}

impl fmt::Display for GroupSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(
            f,
            &self.id,
            self.passengers.len(),
            &self.flight,
            self.discount_percentage,
            self.total_cost,
        )
    }
}
